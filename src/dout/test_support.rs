//! Test support utilities - only compiled in test builds.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::{Arc, Mutex},
    vec,
    vec::Vec,
};

use embedded_hal::{
    digital::{self, ErrorType, OutputPin},
    spi::{self, Operation, SpiDevice},
};

use crate::dout::{
    BitBang, NoChain, NoPin, OutputStorage, OutputStorageBuilder, SpiChain, pins::DirectPins,
};

/// Physical line a mock pin is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Data,
    Clock,
    Latch,
    Direct(usize),
}

/// Every level change across all mock pins, in order.
pub type EventLog = Rc<RefCell<Vec<(Line, bool)>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Output pin that appends each write to a shared log.
pub struct MockPin {
    line: Line,
    log: EventLog,
}

impl MockPin {
    pub fn new(line: Line, log: &EventLog) -> Self {
        Self {
            line,
            log: log.clone(),
        }
    }
}

impl ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.line, true));
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockError;

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl spi::Error for MockError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

/// Output pin that rejects every write.
pub struct FailingPin;

impl ErrorType for FailingPin {
    type Error = MockError;
}

impl OutputPin for FailingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(MockError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(MockError)
    }
}

/// SPI device that records the bytes written in each transaction.
#[derive(Clone, Default)]
pub struct RecordingSpi {
    pub transactions: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl spi::ErrorType for RecordingSpi {
    type Error = core::convert::Infallible;
}

impl SpiDevice for RecordingSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut written = Vec::new();
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                written.extend_from_slice(bytes);
            }
        }
        self.transactions.borrow_mut().push(written);
        Ok(())
    }
}

/// Thread-safe variant of [`RecordingSpi`], for storages shared across threads.
#[derive(Clone, Default)]
pub struct SharedSpi {
    pub transactions: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl spi::ErrorType for SharedSpi {
    type Error = core::convert::Infallible;
}

impl SpiDevice for SharedSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut written = Vec::new();
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                written.extend_from_slice(bytes);
            }
        }
        self.transactions.lock().unwrap().push(written);
        Ok(())
    }
}

/// SPI device whose every transaction fails.
pub struct FailingSpi;

impl spi::ErrorType for FailingSpi {
    type Error = MockError;
}

impl SpiDevice for FailingSpi {
    fn transaction(&mut self, _operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        Err(MockError)
    }
}

/// Last level written to each of the first `count` direct pins.
pub fn pin_levels(log: &EventLog, count: usize) -> Vec<bool> {
    let mut levels = vec![false; count];
    for (line, level) in log.borrow().iter() {
        if let Line::Direct(index) = *line {
            if index < count {
                levels[index] = *level;
            }
        }
    }
    levels
}

/// Replays a bit-banged event log through a simulated 74HC595 chain.
///
/// Register 0 is the one wired to the data line. On each rising clock edge
/// every register shifts left by one and Q7 feeds the next register; on each
/// rising latch edge the shift stage is copied to the outputs.
#[derive(Debug, Default)]
pub struct ChainReplay {
    /// Parallel outputs per register after the last latch.
    pub outputs: Vec<u8>,
    /// Data bits sampled on each rising clock edge.
    pub clocked_bits: Vec<u8>,
    /// Rising latch edges seen.
    pub latch_commits: usize,
    /// Clock edges seen while the latch was high.
    pub bits_outside_latch: usize,
}

impl ChainReplay {
    pub fn run(log: &EventLog, registers: usize) -> Self {
        let mut stage = vec![0u8; registers];
        let mut replay = ChainReplay {
            outputs: vec![0u8; registers],
            ..Default::default()
        };

        let mut data = false;
        let mut clock: Option<bool> = None;
        let mut latch: Option<bool> = None;

        for &(line, level) in log.borrow().iter() {
            match line {
                Line::Data => data = level,
                Line::Clock => {
                    if level && clock != Some(true) {
                        let mut carry = data as u8;
                        for byte in stage.iter_mut() {
                            let out = *byte >> 7;
                            *byte = (*byte << 1) | carry;
                            carry = out;
                        }
                        replay.clocked_bits.push(data as u8);
                        if latch == Some(true) {
                            replay.bits_outside_latch += 1;
                        }
                    }
                    clock = Some(level);
                }
                Line::Latch => {
                    if level && latch == Some(false) {
                        replay.outputs.copy_from_slice(&stage);
                        replay.latch_commits += 1;
                    }
                    latch = Some(level);
                }
                Line::Direct(_) => {}
            }
        }

        replay
    }
}

pub type BitBangStorage =
    OutputStorage<4, 4, MockPin, BitBang<MockPin, MockPin, MockPin>>;
pub type SpiStorage = OutputStorage<4, 1, NoPin, SpiChain<RecordingSpi>>;

/// Bit-banged storage with `direct` mock pins and `chain_bytes` registers.
///
/// Assembled without the builder so the pin type stays `MockPin` even when
/// no direct pins are plugged.
pub fn bitbang_storage(direct: usize, chain_bytes: usize) -> (BitBangStorage, EventLog) {
    let log = event_log();
    let transport = BitBang::new(
        MockPin::new(Line::Data, &log),
        MockPin::new(Line::Clock, &log),
        MockPin::new(Line::Latch, &log),
    );

    let mut pins = DirectPins::new();
    for index in 0..direct {
        pins.push(MockPin::new(Line::Direct(index), &log)).unwrap();
    }

    let mut storage = OutputStorage::new(pins, chain_bytes, transport);
    storage.init().unwrap();
    (storage, log)
}

/// Chain-only SPI storage, straight out of the builder.
pub fn spi_storage(chain_bytes: usize) -> (SpiStorage, RecordingSpi) {
    let spi = RecordingSpi::default();
    let storage = OutputStorageBuilder::new()
        .chain_capacity::<4>()
        .pin_capacity::<1>()
        .plug_chain(chain_bytes)
        .unwrap()
        .transport(SpiChain::new(spi.clone()))
        .build()
        .unwrap();
    (storage, spi)
}

/// Chain-only SPI storage with the boot-time transmission already sent
/// and the recording cleared.
pub fn settled_spi_storage(chain_bytes: usize) -> (SpiStorage, RecordingSpi) {
    let (storage, spi) = spi_storage(chain_bytes);
    storage.flush_buffer();
    storage.flush().unwrap();
    spi.transactions.borrow_mut().clear();
    (storage, spi)
}

/// Storage with neither direct pins nor a chain.
pub fn empty_storage() -> OutputStorage<1, 1, NoPin, NoChain> {
    OutputStorageBuilder::new()
        .chain_capacity::<1>()
        .pin_capacity::<1>()
        .no_chain()
        .build()
        .unwrap()
}
