#![allow(unsafe_code)]

use bitmaps::{Bits, BitsImpl};
use embedded_hal::digital::OutputPin;

use crate::dout::{storage::OutputStorage, transport::ShiftOut, view::HostView};

/// Normal-context handle.
///
/// Writes made through its views accumulate in the primary table and reach
/// the hardware on the next `flush_buffer` + `flush`.
pub struct HostOutput<'a, const CB: usize, const DP: usize, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    storage: &'a OutputStorage<CB, DP, P, T>,
}

impl<'a, const CB: usize, const DP: usize, P, T> core::fmt::Debug for HostOutput<'a, CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HostOutput").finish_non_exhaustive()
    }
}

impl<'a, const CB: usize, const DP: usize, P, T> HostOutput<'a, CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    pub(crate) fn new(storage: &'a OutputStorage<CB, DP, P, T>) -> Self {
        Self { storage }
    }

    pub fn with_view<R>(&self, f: impl FnOnce(&mut HostView<'_, CB, DP, P, T>) -> R) -> R {
        critical_section::with(|_| unsafe { self.with_view_unchecked(f) })
    }

    /// Runs `f` without masking interrupts around it.
    ///
    /// Chain writes then only touch the primary table, while direct pins,
    /// `flush_buffer` and `flush` still take their own short critical
    /// sections. This is the intended way to drive outputs from a main loop.
    ///
    /// # Safety
    /// The caller must be the single normal context of this storage: no
    /// other thread or core may hold a host view at the same time, and the
    /// call must not be made from an interrupt handler.
    pub unsafe fn with_view_unchecked<R>(
        &self,
        f: impl FnOnce(&mut HostView<'_, CB, DP, P, T>) -> R,
    ) -> R {
        let mut view = HostView::new(self.storage);
        f(&mut view)
    }
}
