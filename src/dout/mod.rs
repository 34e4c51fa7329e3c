pub mod blink;
pub mod builder;
pub mod error;
pub mod handle;
pub mod helpers;
pub(crate) mod log;
mod pins;
pub mod storage;
pub(crate) mod table;
pub(crate) mod transmit;
pub mod transport;
pub mod types;
pub mod view;

#[cfg(test)]
mod test_support;

pub use blink::{BlinkTimer, DEFAULT_BLINK_INTERVAL};
pub use builder::OutputStorageBuilder;
pub use error::DoutError;
pub use handle::{HostOutput, IsrOutput};
pub use pins::NoPin;
pub use storage::OutputStorage;
pub use transport::{BitBang, MODE, NoChain, ShiftOut, SpiChain};
pub use types::{ChainConfig, Context, PortTarget};
pub use view::{HostView, IsrView};

pub mod prelude {
    pub use super::{
        BitBang, BlinkTimer, ChainConfig, Context, DEFAULT_BLINK_INTERVAL, DoutError, HostOutput,
        HostView, IsrOutput, IsrView, NoChain, NoPin, OutputStorage, OutputStorageBuilder,
        PortTarget, ShiftOut, SpiChain,
    };
}
