#![allow(unsafe_code)]

use bitmaps::{Bits, BitsImpl};
use embedded_hal::digital::OutputPin;

use crate::dout::{
    DoutError, PortTarget, helpers::resolve_port, storage::OutputStorage, table::ChainTable,
    transmit::transmit, transport::ShiftOut,
};

/// Normal-context view of the outputs.
///
/// Chain writes land in the primary table and set the dirty flag.
/// [`flush_buffer`](Self::flush_buffer) hands them to the shadow table and
/// [`flush`](Self::flush) clocks the shadow table out. Direct pins are driven
/// immediately.
pub struct HostView<'a, const CB: usize, const DP: usize, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    storage: &'a OutputStorage<CB, DP, P, T>,
}

impl<'a, const CB: usize, const DP: usize, P, T> core::fmt::Debug for HostView<'a, CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HostView").finish_non_exhaustive()
    }
}

impl<'a, const CB: usize, const DP: usize, P, T> HostView<'a, CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    pub(crate) fn new(storage: &'a OutputStorage<CB, DP, P, T>) -> Self {
        Self { storage }
    }

    fn with_primary<R>(&self, f: impl FnOnce(&mut ChainTable<CB>) -> R) -> R {
        // SAFETY: host views only exist inside `HostOutput::with_view*`,
        // i.e. in the normal context, and `f` is always crate code.
        unsafe { self.storage.with_primary(f) }
    }

    /// Writes one logical port.
    ///
    /// Writing the level a chain bit already holds changes nothing and
    /// leaves the dirty flag alone.
    ///
    /// # Errors
    /// * [`DoutError::OutOfRange`] - port outside a non-empty port space
    /// * [`DoutError::Pin`] - the direct pin rejected the write
    pub fn write(&mut self, port: u16, level: bool) -> Result<(), DoutError> {
        match resolve_port(&self.storage.config, port)? {
            None => Ok(()),
            Some(PortTarget::Pin(index)) => self.storage.with_shared(|s| s.pins.set(index, level)),
            Some(PortTarget::Chain { byte, bit }) => {
                self.with_primary(|primary| {
                    if primary.set_bit(byte, bit, level) {
                        primary.mark_changed();
                    }
                });
                Ok(())
            }
        }
    }

    /// Drives every direct pin and every chain bit to `level`.
    pub fn write_all(&mut self, level: bool) -> Result<(), DoutError> {
        let config = self.storage.config;
        if config.total_ports() == 0 {
            return Ok(());
        }

        self.storage.with_shared(|s| s.pins.set_all(level))?;
        if config.chain_bytes > 0 {
            self.with_primary(|primary| {
                primary.fill(level);
                primary.mark_changed();
            });
        }
        Ok(())
    }

    /// Copies the primary table into the shadow table and marks it pending.
    ///
    /// Does nothing unless the primary table is dirty. The copy runs in one
    /// critical section, so the interrupt context never observes a half
    /// copied table. The dirty flag is cleared afterwards.
    pub fn flush_buffer(&mut self) {
        let storage = self.storage;
        self.with_primary(|primary| {
            if !primary.is_changed() {
                return;
            }
            storage.with_shared(|s| {
                s.shadow.copy_from(primary);
                s.shadow.mark_changed();
            });
            primary.clear_changed();
        });
    }

    /// Transmits the shadow table if it is pending.
    ///
    /// Runs in a critical section, so an interrupt-context transmission can
    /// not interleave with it on the data, clock and latch lines.
    pub fn flush(&mut self) -> Result<(), DoutError> {
        self.storage
            .with_shared(|s| transmit(s.shadow, s.transport))
    }

    /// Last level written to `port` from the normal context.
    ///
    /// Chain ports read the primary table, which may not be on the hardware yet.
    pub fn level(&self, port: u16) -> Result<bool, DoutError> {
        match resolve_port(&self.storage.config, port)?.ok_or(DoutError::OutOfRange)? {
            PortTarget::Pin(index) => Ok(self.storage.with_shared(|s| s.pins.level(index))),
            PortTarget::Chain { byte, bit } => Ok(self.with_primary(|primary| primary.bit(byte, bit))),
        }
    }

    /// Returns true if the primary table holds changes not yet in the shadow table.
    pub fn is_dirty(&self) -> bool {
        self.with_primary(|primary| primary.is_changed())
    }

    /// Returns true if the shadow table holds changes not yet transmitted.
    pub fn is_pending(&self) -> bool {
        self.storage.with_shared(|s| s.shadow.is_changed())
    }
}
