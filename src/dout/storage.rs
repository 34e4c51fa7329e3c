#![allow(unsafe_code)]

use core::cell::UnsafeCell;

use bitmaps::{Bits, BitsImpl};
use embedded_hal::digital::OutputPin;

use crate::dout::{
    ChainConfig, Context, DoutError,
    handle::{HostOutput, IsrOutput},
    log::debug,
    pins::DirectPins,
    table::ChainTable,
    transport::ShiftOut,
};

/// State reachable from both execution contexts.
///
/// Only handed out for the duration of one crate-internal closure.
pub(crate) struct Shared<'a, const CB: usize, const DP: usize, P, T>
where
    BitsImpl<DP>: Bits,
{
    pub(crate) shadow: &'a mut ChainTable<CB>,
    pub(crate) pins: &'a mut DirectPins<P, DP>,
    pub(crate) transport: &'a mut T,
}

/// Output driver state: direct pins plus a double-buffered shift register chain.
///
/// # Const Generics
/// - `CB`: Chain byte capacity (maximum number of shift registers)
/// - `DP`: Direct pin capacity, at least 1
///
/// # Type Parameters
/// - `P`: Direct pin type
/// - `T`: Chain transport ([`BitBang`](crate::dout::BitBang),
///   [`SpiChain`](crate::dout::SpiChain) or [`NoChain`](crate::dout::NoChain))
///
/// The primary table belongs to the normal context. The shadow table, the
/// direct pins and the transport are shared with the interrupt context and
/// are only touched inside a critical section (or under the contract of an
/// `unchecked` view).
pub struct OutputStorage<const CB: usize, const DP: usize, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    pub(crate) config: ChainConfig,
    pub(crate) primary: UnsafeCell<ChainTable<CB>>,
    pub(crate) shadow: UnsafeCell<ChainTable<CB>>,
    pub(crate) pins: UnsafeCell<DirectPins<P, DP>>,
    pub(crate) transport: UnsafeCell<T>,
}

// SAFETY: every access to the cells goes through a critical section or an
// `unsafe` unchecked view whose caller upholds the single-context contract.
unsafe impl<const CB: usize, const DP: usize, P, T> Sync for OutputStorage<CB, DP, P, T>
where
    P: OutputPin + Send,
    T: ShiftOut + Send,
    BitsImpl<DP>: Bits,
{
}

impl<const CB: usize, const DP: usize, P, T> core::fmt::Debug for OutputStorage<CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OutputStorage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<const CB: usize, const DP: usize, P, T> OutputStorage<CB, DP, P, T>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    pub(crate) fn new(pins: DirectPins<P, DP>, chain_bytes: usize, transport: T) -> Self {
        Self {
            config: ChainConfig::new(pins.len(), chain_bytes),
            primary: UnsafeCell::new(ChainTable::new(chain_bytes)),
            shadow: UnsafeCell::new(ChainTable::new(chain_bytes)),
            pins: UnsafeCell::new(pins),
            transport: UnsafeCell::new(transport),
        }
    }

    /// Configures the physical interface and arms the first transmission.
    ///
    /// Latch idles high, direct pins go low and the primary table is marked
    /// dirty so the first `flush_buffer` + `flush` clears the chain outputs.
    pub(crate) fn init(&mut self) -> Result<(), DoutError> {
        self.transport.get_mut().init()?;
        self.pins.get_mut().init()?;
        if self.config.chain_bytes > 0 {
            self.primary.get_mut().mark_changed();
        }
        debug!(
            "dout: {=usize} direct pins, {=usize} chain bytes",
            self.config.direct_pins,
            self.config.chain_bytes
        );
        Ok(())
    }

    /// Handle for the cooperative (main loop) context.
    pub fn host_output(&self) -> HostOutput<'_, CB, DP, P, T> {
        HostOutput::new(self)
    }

    /// Handle for the preemptive (interrupt) context.
    pub fn isr_output(&self) -> IsrOutput<'_, CB, DP, P, T> {
        IsrOutput::new(self)
    }

    #[inline]
    pub fn config(&self) -> ChainConfig {
        self.config
    }

    /// Total number of logical ports.
    #[inline]
    pub fn size_of(&self) -> usize {
        self.config.total_ports()
    }

    /// Writes one logical port from the given context.
    ///
    /// Shorthand for a one-shot view on the matching handle.
    pub fn write(&self, port: u16, level: bool, context: Context) -> Result<(), DoutError> {
        match context {
            Context::Normal => self.host_output().with_view(|view| view.write(port, level)),
            Context::Interrupt => self.isr_output().with_view(|view| view.write(port, level)),
        }
    }

    /// Drives every logical port to `level` from the given context.
    pub fn write_all(&self, level: bool, context: Context) -> Result<(), DoutError> {
        match context {
            Context::Normal => self.host_output().with_view(|view| view.write_all(level)),
            Context::Interrupt => self.isr_output().with_view(|view| view.write_all(level)),
        }
    }

    /// Copies pending normal-context writes into the shadow table.
    ///
    /// Normal context only.
    pub fn flush_buffer(&self) {
        self.host_output().with_view(|view| view.flush_buffer())
    }

    /// Transmits the shadow table if it holds untransmitted changes.
    ///
    /// Normal context only.
    pub fn flush(&self) -> Result<(), DoutError> {
        self.host_output().with_view(|view| view.flush())
    }

    /// Runs `f` on the primary table.
    ///
    /// # Safety
    /// Caller must be the normal context and must not reenter this call
    /// from `f`. The interrupt context never touches the primary table.
    pub(crate) unsafe fn with_primary<R>(&self, f: impl FnOnce(&mut ChainTable<CB>) -> R) -> R {
        let primary = unsafe { &mut *self.primary.get() };
        f(primary)
    }

    /// Runs `f` on the cross-context state inside a critical section.
    pub(crate) fn with_shared<R>(&self, f: impl FnOnce(Shared<'_, CB, DP, P, T>) -> R) -> R {
        critical_section::with(|_| unsafe { self.with_shared_unchecked(f) })
    }

    /// Runs `f` on the cross-context state without a critical section.
    ///
    /// # Safety
    /// Caller must guarantee that nothing else can touch the shadow table,
    /// the direct pins or the transport while `f` runs, for example because
    /// it executes in a non-nested interrupt handler.
    pub(crate) unsafe fn with_shared_unchecked<R>(
        &self,
        f: impl FnOnce(Shared<'_, CB, DP, P, T>) -> R,
    ) -> R {
        let shared = unsafe {
            Shared {
                shadow: &mut *self.shadow.get(),
                pins: &mut *self.pins.get(),
                transport: &mut *self.transport.get(),
            }
        };
        f(shared)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::dout::{
        Context, DoutError, OutputStorageBuilder, SpiChain,
        test_support::{ChainReplay, Line, SharedSpi, bitbang_storage, pin_levels, spi_storage},
    };

    #[test]
    fn size_of_counts_pins_and_chain_bits() {
        let (storage, _log) = bitbang_storage(2, 1);
        assert_eq!(storage.size_of(), 10);
        assert_eq!(storage.config().direct_pins, 2);
        assert_eq!(storage.config().chain_bytes, 1);
    }

    #[test]
    fn first_flush_after_init_clears_chain() {
        let (storage, log) = bitbang_storage(0, 2);

        storage.flush_buffer();
        storage.flush().unwrap();

        let replay = ChainReplay::run(&log, 2);
        assert_eq!(replay.latch_commits, 1);
        assert_eq!(replay.outputs, [0x00, 0x00]);
    }

    #[test]
    fn documented_two_pin_one_register_scenario() {
        let (storage, log) = bitbang_storage(2, 1);
        // Consume the init transmission
        storage.flush_buffer();
        storage.flush().unwrap();
        log.borrow_mut().clear();

        storage.write(0, true, Context::Normal).unwrap();
        assert_eq!(pin_levels(&log, 2), [true, false]);

        storage.write(2, true, Context::Normal).unwrap();
        storage.host_output().with_view(|view| {
            assert!(view.is_dirty());
            assert!(!view.is_pending());
        });
        // No chain traffic yet
        assert!(log.borrow().iter().all(|(line, _)| matches!(line, Line::Direct(_))));

        storage.flush_buffer();
        storage.host_output().with_view(|view| assert!(view.is_pending()));

        storage.flush().unwrap();
        storage.host_output().with_view(|view| assert!(!view.is_pending()));

        let replay = ChainReplay::run(&log, 1);
        assert_eq!(replay.clocked_bits, [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(replay.outputs, [0x01]);
        assert_eq!(replay.latch_commits, 1);
        assert_eq!(replay.bits_outside_latch, 0);
    }

    #[test]
    fn interrupt_write_transmits_whole_shadow() {
        let (storage, spi) = spi_storage(2);
        storage.flush_buffer();
        storage.flush().unwrap();
        spi.transactions.borrow_mut().clear();

        storage.write(0, true, Context::Interrupt).unwrap();
        storage.write(15, true, Context::Interrupt).unwrap();

        // Each write sends the full chain, last register first
        assert_eq!(
            *spi.transactions.borrow(),
            [vec![0x00, 0x01], vec![0x80, 0x01]]
        );
    }

    #[test]
    fn write_all_from_both_contexts() {
        let (storage, spi) = spi_storage(2);

        storage.write_all(true, Context::Normal).unwrap();
        storage.flush_buffer();
        storage.flush().unwrap();
        assert_eq!(spi.transactions.borrow().last(), Some(&vec![0xFF, 0xFF]));

        storage.write_all(false, Context::Interrupt).unwrap();
        assert_eq!(spi.transactions.borrow().last(), Some(&vec![0x00, 0x00]));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let (storage, _log) = bitbang_storage(1, 1);
        assert_eq!(
            storage.write(9, true, Context::Normal),
            Err(DoutError::OutOfRange)
        );
        assert_eq!(
            storage.write(9, true, Context::Interrupt),
            Err(DoutError::OutOfRange)
        );
    }

    #[test]
    fn concurrent_contexts_send_whole_frames() {
        const ROUNDS: usize = 2_000;

        let spi = SharedSpi::default();
        let storage = OutputStorageBuilder::new()
            .chain_capacity::<4>()
            .pin_capacity::<1>()
            .plug_chain(4)
            .unwrap()
            .transport(SpiChain::new(spi.clone()))
            .build()
            .unwrap();

        // Every normal write flips its bit, so each round marks the primary dirty
        let normal_level = |round: usize| (round / 32) % 2 == 0;

        thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..ROUNDS {
                    let port = (round % 32) as u16;
                    storage
                        .write(port, round % 3 == 0, Context::Interrupt)
                        .unwrap();
                }
            });
            scope.spawn(|| {
                for round in 0..ROUNDS {
                    let port = (round % 32) as u16;
                    storage
                        .write(port, normal_level(round), Context::Normal)
                        .unwrap();
                    storage.flush_buffer();
                    storage.flush().unwrap();
                }
            });
        });

        let mut expected = [0u8; 4];
        for round in 0..ROUNDS {
            let port = round % 32;
            if normal_level(round) {
                expected[port / 8] |= 1 << (port % 8);
            } else {
                expected[port / 8] &= !(1 << (port % 8));
            }
        }

        // Re-dirty the primary without changing it, then push it out
        let port0 = expected[0] & 1 != 0;
        storage.write(0, !port0, Context::Normal).unwrap();
        storage.write(0, port0, Context::Normal).unwrap();
        storage.flush_buffer();
        storage.flush().unwrap();

        let frames = spi.transactions.lock().unwrap();
        assert!(frames.len() > ROUNDS);
        assert!(frames.iter().all(|frame| frame.len() == 4));
        // Last normal write wins once the primary is handed over
        let last: Vec<u8> = expected.iter().rev().copied().collect();
        assert_eq!(frames.last(), Some(&last));
    }
}
