mod host;
mod isr;

pub use host::HostView;
pub use isr::IsrView;
