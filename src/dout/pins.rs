use bitmaps::{Bitmap, Bits, BitsImpl};
use embedded_hal::digital::{OutputPin, PinState};
use heapless::Vec;

use crate::dout::DoutError;

/// Pin type of a storage that has no direct pins plugged.
///
/// Uninhabited: a `NoPin` value can never exist, so it is never driven.
#[derive(Debug)]
pub enum NoPin {}

impl embedded_hal::digital::ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
}

/// Outputs wired straight to the microcontroller.
///
/// Writes are applied immediately; the bitmap only remembers the last
/// level driven so it can be read back.
pub(crate) struct DirectPins<P, const DP: usize>
where
    BitsImpl<DP>: Bits,
{
    pins: Vec<P, DP>,
    levels: Bitmap<DP>,
}

impl<P, const DP: usize> DirectPins<P, DP>
where
    P: OutputPin,
    BitsImpl<DP>: Bits,
{
    pub(crate) fn new() -> Self {
        Self {
            pins: Vec::new(),
            levels: Bitmap::new(),
        }
    }

    pub(crate) fn push(&mut self, pin: P) -> Result<(), DoutError> {
        self.pins
            .push(pin)
            .map_err(|_| DoutError::AllocationFailure)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pins.len()
    }

    /// Drives every pin low.
    pub(crate) fn init(&mut self) -> Result<(), DoutError> {
        self.set_all(false)
    }

    pub(crate) fn set(&mut self, index: usize, level: bool) -> Result<(), DoutError> {
        let pin = self.pins.get_mut(index).ok_or(DoutError::OutOfRange)?;
        pin.set_state(PinState::from(level))
            .map_err(|_| DoutError::Pin)?;
        self.levels.set(index, level);
        Ok(())
    }

    pub(crate) fn set_all(&mut self, level: bool) -> Result<(), DoutError> {
        for index in 0..self.pins.len() {
            self.set(index, level)?;
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn level(&self, index: usize) -> bool {
        self.levels.get(index)
    }
}
