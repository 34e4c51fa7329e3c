#![allow(unsafe_code)]

use bitmaps::{Bits, BitsImpl};
use embedded_hal::digital::OutputPin;

use crate::dout::{storage::OutputStorage, transport::ShiftOut, view::IsrView};

/// Interrupt-context handle.
///
/// Writes made through its views go straight to the shadow table and are
/// transmitted before the write returns.
pub struct IsrOutput<'a, const CB: usize, const DP: usize, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    storage: &'a OutputStorage<CB, DP, P, T>,
}

impl<'a, const CB: usize, const DP: usize, P, T> core::fmt::Debug for IsrOutput<'a, CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IsrOutput").finish_non_exhaustive()
    }
}

impl<'a, const CB: usize, const DP: usize, P, T> IsrOutput<'a, CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    pub(crate) fn new(storage: &'a OutputStorage<CB, DP, P, T>) -> Self {
        Self { storage }
    }

    pub fn with_view<R>(&self, f: impl FnOnce(&mut IsrView<'_, CB, DP, P, T>) -> R) -> R {
        critical_section::with(|_| unsafe { self.with_view_unchecked(f) })
    }

    /// # Safety
    /// This function is unsafe because it requires exclusive access to the
    /// shadow table, the direct pins and the transport. Generally, if you are
    /// inside an ISR that cannot be interrupted by other code using this
    /// storage, then it is safe to call this function.
    pub unsafe fn with_view_unchecked<R>(
        &self,
        f: impl FnOnce(&mut IsrView<'_, CB, DP, P, T>) -> R,
    ) -> R {
        let mut view = IsrView::new(self.storage);
        f(&mut view)
    }
}
