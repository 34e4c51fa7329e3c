/// Errors that can occur while driving outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoutError {
    /// Logical port is outside the configured port space.
    OutOfRange,
    /// Requested pins or chain bytes exceed the fixed storage capacity.
    AllocationFailure,
    /// A direct or control output pin reported a failure.
    Pin,
    /// The SPI device reported a failure.
    Bus,
}

impl core::fmt::Display for DoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DoutError::OutOfRange => write!(f, "logical port outside configured port space"),
            DoutError::AllocationFailure => write!(f, "fixed storage capacity exceeded"),
            DoutError::Pin => write!(f, "output pin failure"),
            DoutError::Bus => write!(f, "spi bus failure"),
        }
    }
}

impl core::error::Error for DoutError {}
