use core::marker::PhantomData;

use bitmaps::{Bits, BitsImpl};
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::dout::{
    ChainConfig, DoutError,
    log::warning,
    pins::{DirectPins, NoPin},
    storage::OutputStorage,
    transport::{NoChain, ShiftOut},
};

// Builder states
pub struct NeedChainCapacity;
pub struct NeedPinCapacity;
pub struct NoPinsPlugged;
pub struct Plugging;
pub struct Ready;

mod sealed {
    pub trait Configuring {}
    impl Configuring for super::NoPinsPlugged {}
    impl Configuring for super::Plugging {}
}

/// Step-by-step configuration of an [`OutputStorage`].
///
/// Capacities are fixed first, then direct pins are plugged in port order,
/// the chain length is set, and a transport is chosen:
///
/// ```rust,no_run
/// use embedded_dout::dout::{BitBang, DoutError, OutputStorageBuilder};
/// # use core::convert::Infallible;
/// # use embedded_hal::digital::{ErrorType, OutputPin};
/// # struct Gpio;
/// # impl ErrorType for Gpio {
/// #     type Error = Infallible;
/// # }
/// # impl OutputPin for Gpio {
/// #     fn set_low(&mut self) -> Result<(), Infallible> { Ok(()) }
/// #     fn set_high(&mut self) -> Result<(), Infallible> { Ok(()) }
/// # }
/// # fn main() -> Result<(), DoutError> {
/// # let (led_a, led_b, data, clock, latch) = (Gpio, Gpio, Gpio, Gpio, Gpio);
/// let storage = OutputStorageBuilder::new()
///     .chain_capacity::<4>()
///     .pin_capacity::<2>()
///     .plug(led_a)?        // port 0
///     .plug(led_b)?        // port 1
///     .plug_chain(2)?      // ports 2..18
///     .transport(BitBang::new(data, clock, latch))
///     .build()?;
/// # let _ = storage;
/// # Ok(())
/// # }
/// ```
pub struct OutputStorageBuilder<const CB: usize, const DP: usize, P, T, State> {
    pins: Vec<P, DP>,
    chain_bytes: usize,
    transport: T,
    _phantom: PhantomData<State>,
}

// Start the builder
impl OutputStorageBuilder<0, 0, NoPin, NoChain, NeedChainCapacity> {
    pub fn new() -> Self {
        OutputStorageBuilder {
            pins: Vec::new(),
            chain_bytes: 0,
            transport: NoChain,
            _phantom: PhantomData,
        }
    }
}

impl Default for OutputStorageBuilder<0, 0, NoPin, NoChain, NeedChainCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

// Set chain capacity
impl OutputStorageBuilder<0, 0, NoPin, NoChain, NeedChainCapacity> {
    /// Maximum number of shift registers the storage can hold.
    pub fn chain_capacity<const CB: usize>(
        self,
    ) -> OutputStorageBuilder<CB, 0, NoPin, NoChain, NeedPinCapacity> {
        OutputStorageBuilder {
            pins: Vec::new(),
            chain_bytes: 0,
            transport: NoChain,
            _phantom: PhantomData,
        }
    }
}

// Set direct pin capacity
impl<const CB: usize> OutputStorageBuilder<CB, 0, NoPin, NoChain, NeedPinCapacity> {
    /// Maximum number of direct pins. Must be at least 1, even when none
    /// will be plugged.
    pub fn pin_capacity<const DP: usize>(
        self,
    ) -> OutputStorageBuilder<CB, DP, NoPin, NoChain, NoPinsPlugged> {
        OutputStorageBuilder {
            pins: Vec::new(),
            chain_bytes: 0,
            transport: NoChain,
            _phantom: PhantomData,
        }
    }
}

// First direct pin fixes the pin type
impl<const CB: usize, const DP: usize>
    OutputStorageBuilder<CB, DP, NoPin, NoChain, NoPinsPlugged>
{
    /// Plugs the direct pin for logical port 0.
    ///
    /// # Errors
    /// * [`DoutError::AllocationFailure`] - if the pin capacity is zero
    pub fn plug<P: OutputPin>(
        self,
        pin: P,
    ) -> Result<OutputStorageBuilder<CB, DP, P, NoChain, Plugging>, DoutError> {
        let mut pins = Vec::new();
        pins.push(pin).map_err(|_| DoutError::AllocationFailure)?;

        Ok(OutputStorageBuilder {
            pins,
            chain_bytes: self.chain_bytes,
            transport: NoChain,
            _phantom: PhantomData,
        })
    }
}

// Further direct pins
impl<const CB: usize, const DP: usize, P: OutputPin>
    OutputStorageBuilder<CB, DP, P, NoChain, Plugging>
{
    /// Plugs the direct pin for the next logical port.
    ///
    /// # Errors
    /// * [`DoutError::AllocationFailure`] - if the pin capacity is exhausted
    pub fn plug(mut self, pin: P) -> Result<Self, DoutError> {
        self.pins
            .push(pin)
            .map_err(|_| DoutError::AllocationFailure)?;
        Ok(self)
    }
}

// Chain length and transport
impl<const CB: usize, const DP: usize, P, S: sealed::Configuring>
    OutputStorageBuilder<CB, DP, P, NoChain, S>
{
    /// Sets how many shift registers are wired in the chain.
    ///
    /// Chain ports follow the direct pins in the logical port space.
    ///
    /// # Errors
    /// * [`DoutError::AllocationFailure`] - if `chain_bytes` exceeds the chain
    ///   capacity, or the port space would outgrow `u16` port numbers
    pub fn plug_chain(mut self, chain_bytes: usize) -> Result<Self, DoutError> {
        if chain_bytes > CB || !ChainConfig::new(self.pins.len(), chain_bytes).is_addressable() {
            return Err(DoutError::AllocationFailure);
        }
        self.chain_bytes = chain_bytes;
        Ok(self)
    }

    /// Selects the transport that clocks the chain out.
    pub fn transport<T: ShiftOut>(self, transport: T) -> OutputStorageBuilder<CB, DP, P, T, Ready> {
        OutputStorageBuilder {
            pins: self.pins,
            chain_bytes: self.chain_bytes,
            transport,
            _phantom: PhantomData,
        }
    }

    /// Direct pins only. Any chain length set before is dropped.
    pub fn no_chain(self) -> OutputStorageBuilder<CB, DP, P, NoChain, Ready> {
        if self.chain_bytes > 0 {
            warning!("dout: no_chain() drops {=usize} plugged chain bytes", self.chain_bytes);
        }

        OutputStorageBuilder {
            pins: self.pins,
            chain_bytes: 0,
            transport: NoChain,
            _phantom: PhantomData,
        }
    }
}

// Build the final storage
impl<const CB: usize, const DP: usize, P, T> OutputStorageBuilder<CB, DP, P, T, Ready>
where
    P: OutputPin,
    T: ShiftOut,
    BitsImpl<DP>: Bits,
{
    /// Builds the storage and initializes the hardware.
    ///
    /// Latch idles high, direct pins are driven low and both tables start
    /// zeroed, with the first transmission armed.
    ///
    /// # Errors
    /// * [`DoutError::AllocationFailure`] - chain bytes were plugged but the
    ///   transport has no chain, or the port space outgrew `u16` port numbers
    /// * [`DoutError::Pin`] / [`DoutError::Bus`] - hardware setup failed
    pub fn build(self) -> Result<OutputStorage<CB, DP, P, T>, DoutError> {
        if self.chain_bytes > 0 && !T::DRIVES_CHAIN {
            warning!("dout: {=usize} chain bytes plugged without a chain transport", self.chain_bytes);
            return Err(DoutError::AllocationFailure);
        }
        if !ChainConfig::new(self.pins.len(), self.chain_bytes).is_addressable() {
            return Err(DoutError::AllocationFailure);
        }

        let mut pins = DirectPins::new();
        for pin in self.pins {
            pins.push(pin)?;
        }

        let mut storage = OutputStorage::new(pins, self.chain_bytes, self.transport);
        storage.init()?;
        Ok(storage)
    }
}
