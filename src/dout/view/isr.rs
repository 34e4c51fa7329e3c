#![allow(unsafe_code)]

use bitmaps::{Bits, BitsImpl};
use embedded_hal::digital::OutputPin;

use crate::dout::{
    DoutError, PortTarget,
    helpers::resolve_port,
    storage::{OutputStorage, Shared},
    transmit::transmit,
    transport::ShiftOut,
};

/// Interrupt-context view of the outputs.
///
/// Chain writes bypass the primary table: they modify the shadow table and,
/// when a bit actually changed, transmit the whole shadow table before
/// returning. Direct pins are driven immediately.
pub struct IsrView<'a, const CB: usize, const DP: usize, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    storage: &'a OutputStorage<CB, DP, P, T>,
}

impl<'a, const CB: usize, const DP: usize, P, T> core::fmt::Debug for IsrView<'a, CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IsrView").finish_non_exhaustive()
    }
}

impl<'a, const CB: usize, const DP: usize, P, T> IsrView<'a, CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    pub(crate) fn new(storage: &'a OutputStorage<CB, DP, P, T>) -> Self {
        Self { storage }
    }

    fn with_shared<R>(&self, f: impl FnOnce(Shared<'_, CB, DP, P, T>) -> R) -> R {
        // SAFETY: isr views only exist inside a critical section or under
        // the exclusivity contract of `IsrOutput::with_view_unchecked`.
        unsafe { self.storage.with_shared_unchecked(f) }
    }

    /// Writes one logical port and transmits immediately if a chain bit changed.
    ///
    /// # Errors
    /// * [`DoutError::OutOfRange`] - port outside a non-empty port space
    /// * [`DoutError::Pin`] / [`DoutError::Bus`] - the hardware rejected the write
    pub fn write(&mut self, port: u16, level: bool) -> Result<(), DoutError> {
        match resolve_port(&self.storage.config, port)? {
            None => Ok(()),
            Some(PortTarget::Pin(index)) => self.with_shared(|s| s.pins.set(index, level)),
            Some(PortTarget::Chain { byte, bit }) => self.with_shared(|s| {
                if !s.shadow.set_bit(byte, bit, level) {
                    return Ok(());
                }
                s.shadow.mark_changed();
                transmit(s.shadow, s.transport)
            }),
        }
    }

    /// Drives every direct pin and every chain bit to `level`, then transmits.
    pub fn write_all(&mut self, level: bool) -> Result<(), DoutError> {
        let config = self.storage.config;
        if config.total_ports() == 0 {
            return Ok(());
        }

        self.with_shared(|s| {
            s.pins.set_all(level)?;
            if config.chain_bytes == 0 {
                return Ok(());
            }
            s.shadow.fill(level);
            s.shadow.mark_changed();
            transmit(s.shadow, s.transport)
        })
    }

    /// Level of `port` as last handed to the hardware path.
    ///
    /// Chain ports read the shadow table.
    pub fn level(&self, port: u16) -> Result<bool, DoutError> {
        match resolve_port(&self.storage.config, port)?.ok_or(DoutError::OutOfRange)? {
            PortTarget::Pin(index) => Ok(self.with_shared(|s| s.pins.level(index))),
            PortTarget::Chain { byte, bit } => Ok(self.with_shared(|s| s.shadow.bit(byte, bit))),
        }
    }

    /// Returns true if the shadow table holds changes not yet transmitted.
    pub fn is_pending(&self) -> bool {
        self.with_shared(|s| s.shadow.is_changed())
    }
}
