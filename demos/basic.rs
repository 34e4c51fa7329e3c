//! Basic example: one status LED plus two 74HC595 on SPI
//!
//! This example demonstrates:
//! - Using the builder to plug a direct pin and a register chain
//! - Buffered normal-context writes with flush_buffer + flush
//! - Transmission order (last register first on the wire)
//! - Driving a blinking LED from the blink timer

use std::{cell::RefCell, convert::Infallible, rc::Rc};

use embedded_dout::prelude::*;
use embedded_hal::{
    digital::{ErrorType, OutputPin},
    spi::{self, Operation, SpiDevice},
};

/// Stand-in for a GPIO, remembering its level.
struct Led(Rc<RefCell<bool>>);

impl ErrorType for Led {
    type Error = Infallible;
}

impl OutputPin for Led {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        *self.0.borrow_mut() = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        *self.0.borrow_mut() = true;
        Ok(())
    }
}

/// Stand-in for an SPI device whose chip select drives the chain latch.
#[derive(Clone, Default)]
struct Bus(Rc<RefCell<Vec<Vec<u8>>>>);

impl spi::ErrorType for Bus {
    type Error = Infallible;
}

impl SpiDevice for Bus {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut frame = Vec::new();
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                frame.extend_from_slice(bytes);
            }
        }
        self.0.borrow_mut().push(frame);
        Ok(())
    }
}

pub fn main() {
    let status = Rc::new(RefCell::new(false));
    let bus = Bus::default();

    let storage = OutputStorageBuilder::new()
        .chain_capacity::<2>()
        .pin_capacity::<1>()
        .plug(Led(status.clone())) // port 0
        .unwrap()
        .plug_chain(2) // ports 1..17
        .unwrap()
        .transport(SpiChain::new(bus.clone()))
        .build()
        .unwrap();

    assert_eq!(storage.size_of(), 17);

    // The first flush after build clears the chain outputs
    storage.flush_buffer();
    storage.flush().unwrap();
    assert_eq!(bus.0.borrow().last(), Some(&vec![0x00, 0x00]));

    storage.host_output().with_view(|view| {
        view.write(0, true).unwrap(); // direct pin, immediate
        view.write(1, true).unwrap(); // register 0, bit 0
        view.write(16, true).unwrap(); // register 1, bit 7
        assert!(view.is_dirty());

        view.flush_buffer();
        view.flush().unwrap();
        assert!(!view.is_pending());
    });

    assert!(*status.borrow());
    assert_eq!(bus.0.borrow().last(), Some(&vec![0x80, 0x01]));
    println!("Frames sent: {:02X?}", bus.0.borrow());

    // Main loop ticks every 100ms, the LED toggles every 250ms
    let mut timer = BlinkTimer::default();
    let mut toggles = 0;
    for now in (0..2_000).step_by(100) {
        let before = timer.blink();
        timer.set_timer(now);
        if timer.blink() != before {
            toggles += 1;
        }
        storage.write(0, timer.blink(), Context::Normal).unwrap();
    }
    println!("LED toggled {toggles} times in 2s");
    assert_eq!(*status.borrow(), timer.blink());
}
