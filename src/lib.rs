//! A `no_std`, no-alloc digital output driver for embedded systems.
//!
//! Drives a flat space of logical output ports backed by direct GPIO pins
//! and a daisy-chain of 74HC595 serial-in/parallel-out shift registers.
//!
//! # Features
//!
//! - **Zero heap allocation** - All storage statically allocated
//! - **Unified port space** - Direct pins first, then eight ports per register
//! - **Double-buffered chain** - Main loop writes are batched, interrupt writes go out at once
//! - **Pluggable transport** - Bit-banged GPIOs or an SPI device, picked at build time
//! - **Blink timing** - A free-running toggle for blinking indicators
//!
//! # Architecture
//!
//! Chain bits live in two tables:
//!
//! ```text
//! ┌──────────────────┐  flush_buffer()  ┌──────────────────┐  flush()  ┌──────────┐
//! │  Primary table   │─────────────────▶│  Shadow table    │──────────▶│ 74HC595  │
//! │  (dirty flag)    │   copy, pending  │  (pending flag)  │  shift +  │  chain   │
//! └──────────────────┘                  └──────────────────┘   latch   └──────────┘
//!          ▲                                     ▲
//!          │ host view write()                   │ isr view write()
//!          │                                     │ (transmits at once)
//! ```
//!
//! - **Normal context** writes mark the primary table dirty
//! - **`flush_buffer`** copies the primary table into the shadow table atomically
//! - **`flush`** clocks the shadow table out, last register first, and latches it
//! - **Interrupt context** writes the shadow table and transmits before returning
//! - **Direct pins** are driven immediately from either context
//!
//! # Example
//!
//! ```rust,no_run
//! use embedded_dout::prelude::*;
//! # use core::convert::Infallible;
//! # use embedded_hal::digital::{ErrorType, OutputPin};
//! # struct Gpio;
//! # impl ErrorType for Gpio {
//! #     type Error = Infallible;
//! # }
//! # impl OutputPin for Gpio {
//! #     fn set_low(&mut self) -> Result<(), Infallible> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Infallible> { Ok(()) }
//! # }
//! # fn main() -> Result<(), DoutError> {
//! # let (led_a, led_b, data, clock, latch) = (Gpio, Gpio, Gpio, Gpio, Gpio);
//!
//! // Two LEDs on GPIOs, then two 74HC595 (ports 2..18)
//! let storage = OutputStorageBuilder::new()
//!     .chain_capacity::<2>()
//!     .pin_capacity::<2>()
//!     .plug(led_a)?
//!     .plug(led_b)?
//!     .plug_chain(2)?
//!     .transport(BitBang::new(data, clock, latch))
//!     .build()?;
//!
//! // Main loop: batch writes, then push them out
//! storage.host_output().with_view(|view| {
//!     view.write(0, true)?;  // GPIO, immediate
//!     view.write(10, true)?; // chain, buffered
//!     view.flush_buffer();
//!     view.flush()
//! })?;
//!
//! // Interrupt handler: the write is on the wire when it returns
//! storage.isr_output().with_view(|view| view.write(17, true))?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(not(test), no_std)]

pub mod dout;

pub mod prelude {
    pub use crate::dout::prelude::*;
}
