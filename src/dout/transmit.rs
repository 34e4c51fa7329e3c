use crate::dout::{DoutError, log::trace, table::ChainTable, transport::ShiftOut};

/// Sends the shadow table to the chain if it holds untransmitted changes.
///
/// Bytes go out in descending chain index so the register wired last
/// receives its byte first. The pending flag is only cleared once the
/// transport reports success; a failed frame is retried on the next call.
pub(crate) fn transmit<const CB: usize, T: ShiftOut>(
    shadow: &mut ChainTable<CB>,
    transport: &mut T,
) -> Result<(), DoutError> {
    if !shadow.is_changed() {
        return Ok(());
    }

    let bytes = shadow.bytes();
    let len = bytes.len();
    if len > 0 {
        let mut frame = [0u8; CB];
        for (slot, byte) in frame.iter_mut().zip(bytes.iter().rev()) {
            *slot = *byte;
        }
        transport.shift_out(&frame[..len])?;
        trace!("dout: shifted {=usize} chain bytes", len);
    }

    shadow.clear_changed();
    Ok(())
}
