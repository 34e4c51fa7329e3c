//! Strategies for clocking the shadow bitmap out to the chain.
//!
//! The strategy is picked when the storage is built: [`BitBang`] drives the
//! data, clock and latch lines from three GPIOs, [`SpiChain`] hands the frame
//! to an SPI device whose chip select is wired to the latch, and [`NoChain`]
//! is used when only direct pins are plugged.

mod bitbang;
mod spi;

pub use bitbang::BitBang;
pub use spi::{MODE, SpiChain};

use crate::dout::DoutError;

/// Clocks a frame of bytes into a daisy-chained shift register.
pub trait ShiftOut {
    /// False for transports that have no chain to shift into.
    const DRIVES_CHAIN: bool = true;

    /// Puts the control lines in their idle state (latch high).
    fn init(&mut self) -> Result<(), DoutError>;

    /// Shifts `frame` out MSB-first and latches it.
    ///
    /// `frame[0]` is shifted first, so it ends up in the register furthest
    /// from the microcontroller once the whole frame is clocked in.
    fn shift_out(&mut self, frame: &[u8]) -> Result<(), DoutError>;
}

/// Transport for setups with direct pins only.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoChain;

impl ShiftOut for NoChain {
    const DRIVES_CHAIN: bool = false;

    fn init(&mut self) -> Result<(), DoutError> {
        Ok(())
    }

    fn shift_out(&mut self, _frame: &[u8]) -> Result<(), DoutError> {
        Ok(())
    }
}
