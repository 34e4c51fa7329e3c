use embedded_hal::spi::{MODE_0, Mode, SpiDevice};

use crate::dout::{DoutError, transport::ShiftOut};

/// SPI mode the 74HC595 expects: data sampled on the rising SRCLK edge.
///
/// The bus owner configures clock rate, mode and MSB-first bit order when it
/// creates the bus; this driver only issues transactions on it.
pub const MODE: Mode = MODE_0;

/// 74HC595 chain on a shared SPI bus.
///
/// The device's chip-select line must be wired to the chain latch (RCLK).
/// Every frame is written in one [`SpiDevice`] transaction, so the device
/// implementation takes the bus, pulls the latch low, clocks the bytes,
/// flushes and raises the latch again. Bus ownership stays with the caller.
pub struct SpiChain<SPI> {
    spi: SPI,
}

impl<SPI> core::fmt::Debug for SpiChain<SPI> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpiChain").finish_non_exhaustive()
    }
}

impl<SPI: SpiDevice> SpiChain<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Gives the SPI device back.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> ShiftOut for SpiChain<SPI> {
    fn init(&mut self) -> Result<(), DoutError> {
        // Chip select idles high inside the SpiDevice implementation.
        Ok(())
    }

    fn shift_out(&mut self, frame: &[u8]) -> Result<(), DoutError> {
        self.spi.write(frame).map_err(|_| DoutError::Bus)
    }
}
