//! Critical section example: Simulating ISR/main loop access patterns
//!
//! This example demonstrates:
//! - Static storage shared between contexts
//! - Main loop batching writes and flushing them
//! - Simulated ISR raising an alarm output that goes out immediately
//! - Every frame reaching the bus whole, whatever the interleaving

use std::sync::{
    Arc, Mutex, OnceLock,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use embedded_dout::prelude::*;
use embedded_hal::{
    digital::{ErrorType, OutputPin},
    spi::{self, Operation, SpiDevice},
};

/// Stand-in for a GPIO backed by a static level.
struct Led(&'static AtomicBool);

impl ErrorType for Led {
    type Error = core::convert::Infallible;
}

impl OutputPin for Led {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.store(false, Ordering::Release);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.store(true, Ordering::Release);
        Ok(())
    }
}

/// Stand-in for an SPI device, safe to share with the ISR thread.
#[derive(Clone, Default)]
struct Bus(Arc<Mutex<Vec<Vec<u8>>>>);

impl spi::ErrorType for Bus {
    type Error = core::convert::Infallible;
}

impl SpiDevice for Bus {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut frame = Vec::new();
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                frame.extend_from_slice(bytes);
            }
        }
        self.0.lock().unwrap().push(frame);
        Ok(())
    }
}

// Type alias for our specific storage configuration
type MyStorage = OutputStorage<2, 1, Led, SpiChain<Bus>>;

// Would be a plain static in embedded, initialized before interrupts are enabled
static STORAGE: OnceLock<MyStorage> = OnceLock::new();

static HEARTBEAT_LED: AtomicBool = AtomicBool::new(false);

// Simulate an interrupt flag
static INTERRUPT_PENDING: AtomicBool = AtomicBool::new(false);

/// Chain port wired to the alarm buzzer.
const ALARM_PORT: u16 = 16;

fn main() {
    println!("=== Critical Section Example ===\n");

    let bus = Bus::default();
    let storage = STORAGE.get_or_init(|| {
        OutputStorageBuilder::new()
            .chain_capacity::<2>()
            .pin_capacity::<1>()
            .plug(Led(&HEARTBEAT_LED))
            .unwrap()
            .plug_chain(2)
            .unwrap()
            .transport(SpiChain::new(bus.clone()))
            .build()
            .unwrap()
    });

    // Spawn ISR simulator thread
    let isr_thread = thread::spawn(|| {
        println!("ISR simulator: Started");

        for _ in 0..40 {
            if INTERRUPT_PENDING.swap(false, Ordering::AcqRel) {
                handle_interrupt();
            }
            thread::sleep(Duration::from_millis(5));
        }

        println!("ISR simulator: Stopped");
    });

    println!("Main loop: Starting\n");
    let host = storage.host_output();

    for cycle in 0..5u16 {
        println!("Main loop: Cycle {cycle}");

        host.with_view(|view| {
            view.write(0, cycle % 2 == 0).unwrap(); // heartbeat, immediate
            view.write(1 + cycle, true).unwrap(); // one more chain output lit
            view.flush_buffer();
            view.flush().unwrap();
        });

        // Trigger "interrupt"
        INTERRUPT_PENDING.store(true, Ordering::Release);

        // Simulate other main loop work
        thread::sleep(Duration::from_millis(20));
    }

    isr_thread.join().unwrap();

    let frames = bus.0.lock().unwrap();
    println!("\nFrames on the bus: {:02X?}", *frames);
    assert!(frames.iter().all(|frame| frame.len() == 2));

    println!("Main loop: Complete - every frame reached the chain whole");
}

// Simulates ISR handler
fn handle_interrupt() {
    let Some(storage) = STORAGE.get() else {
        return;
    };

    println!(">>> ISR: Raising alarm");
    storage.isr_output().with_view(|view| {
        // Shadow table only; transmitted before the write returns
        view.write(ALARM_PORT, true).unwrap();
        assert!(!view.is_pending());
    });
}
