/// Execution context a write originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Context {
    /// Cooperative caller path. Chain writes land in the primary table
    /// and reach hardware on the next `flush_buffer` + `flush`.
    Normal,
    /// Preemptive caller path. Chain writes land in the shadow table and
    /// are transmitted before the write returns.
    Interrupt,
}

/// Port space layout, fixed once the storage is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChainConfig {
    /// Logical ports `[0, direct_pins)` wired to real pins.
    pub direct_pins: usize,
    /// Number of 8-bit shift registers in the chain.
    pub chain_bytes: usize,
}

/// Number of ports a `u16` port number can address.
pub const MAX_PORTS: usize = u16::MAX as usize + 1;

impl ChainConfig {
    pub const fn new(direct_pins: usize, chain_bytes: usize) -> Self {
        Self {
            direct_pins,
            chain_bytes,
        }
    }

    /// Total number of addressable logical ports.
    #[inline]
    pub const fn total_ports(&self) -> usize {
        self.direct_pins + self.chain_bytes * 8
    }

    /// Returns true if every port is reachable with a `u16` port number.
    #[inline]
    pub const fn is_addressable(&self) -> bool {
        self.total_ports() <= MAX_PORTS
    }
}

/// Physical destination of a logical port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortTarget {
    /// Index into the plugged direct pins.
    Pin(usize),
    /// Bit position inside the chain bitmap.
    Chain { byte: usize, bit: u8 },
}
