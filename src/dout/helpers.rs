//! Logical port resolution.
//!
//! These helpers are useful when building custom front-ends (menus, LED
//! matrices, MIDI feedback) that need to reason about where a logical port
//! physically lives before writing to it.

use crate::dout::{ChainConfig, DoutError, PortTarget};

/// Resolves a logical port into a direct pin index or a chain bit position.
///
/// Direct pins occupy ports `[0, direct_pins)`; the rest of the port space
/// maps into the chain, eight ports per shift register.
///
/// Returns `Ok(None)` when the port space is empty, so writes against an
/// unconfigured driver stay silent no-ops.
///
/// # Errors
/// * [`DoutError::OutOfRange`] - if `port >= config.total_ports()`
///
/// # Example
/// ```
/// use embedded_dout::dout::{ChainConfig, PortTarget, helpers::resolve_port};
///
/// // Two direct pins followed by one 74HC595
/// let config = ChainConfig::new(2, 1);
/// assert_eq!(resolve_port(&config, 1), Ok(Some(PortTarget::Pin(1))));
/// assert_eq!(
///     resolve_port(&config, 2),
///     Ok(Some(PortTarget::Chain { byte: 0, bit: 0 }))
/// );
/// assert_eq!(
///     resolve_port(&config, 9),
///     Ok(Some(PortTarget::Chain { byte: 0, bit: 7 }))
/// );
/// ```
pub fn resolve_port(config: &ChainConfig, port: u16) -> Result<Option<PortTarget>, DoutError> {
    let total = config.total_ports();
    if total == 0 {
        return Ok(None);
    }

    let port = port as usize;
    if port >= total {
        return Err(DoutError::OutOfRange);
    }

    if port < config.direct_pins {
        return Ok(Some(PortTarget::Pin(port)));
    }

    let offset = port - config.direct_pins;
    Ok(Some(PortTarget::Chain {
        byte: offset / 8,
        bit: (offset % 8) as u8,
    }))
}
