mod host;
mod isr;

pub use host::HostOutput;
pub use isr::IsrOutput;
