use embedded_hal::digital::{OutputPin, PinState};

use crate::dout::{DoutError, transport::ShiftOut};

/// Bit-banged 74HC595 chain on three GPIOs.
///
/// Each bit is presented on `data` and clocked in with one `clock` pulse.
/// `latch` (RCLK) is held low while shifting and raised afterwards, which
/// copies the shift stage to the parallel outputs in one step.
pub struct BitBang<D, C, L> {
    data: D,
    clock: C,
    latch: L,
}

impl<D, C, L> core::fmt::Debug for BitBang<D, C, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BitBang").finish_non_exhaustive()
    }
}

impl<D, C, L> BitBang<D, C, L>
where
    D: OutputPin,
    C: OutputPin,
    L: OutputPin,
{
    pub fn new(data: D, clock: C, latch: L) -> Self {
        Self { data, clock, latch }
    }

    /// Gives the control pins back.
    pub fn release(self) -> (D, C, L) {
        (self.data, self.clock, self.latch)
    }

    fn shift_byte(&mut self, byte: u8) -> Result<(), DoutError> {
        for bit in (0..8).rev() {
            let level = PinState::from(byte & (1 << bit) != 0);
            self.data.set_state(level).map_err(|_| DoutError::Pin)?;
            self.clock.set_high().map_err(|_| DoutError::Pin)?;
            self.clock.set_low().map_err(|_| DoutError::Pin)?;
        }
        Ok(())
    }
}

impl<D, C, L> ShiftOut for BitBang<D, C, L>
where
    D: OutputPin,
    C: OutputPin,
    L: OutputPin,
{
    fn init(&mut self) -> Result<(), DoutError> {
        self.latch.set_high().map_err(|_| DoutError::Pin)?;
        self.clock.set_low().map_err(|_| DoutError::Pin)?;
        self.data.set_low().map_err(|_| DoutError::Pin)
    }

    fn shift_out(&mut self, frame: &[u8]) -> Result<(), DoutError> {
        self.latch.set_low().map_err(|_| DoutError::Pin)?;
        let shifted = frame.iter().try_for_each(|&byte| self.shift_byte(byte));
        // Release the latch even on a failed shift so the line idles high.
        let latched = self.latch.set_high().map_err(|_| DoutError::Pin);
        shifted.and(latched)
    }
}
