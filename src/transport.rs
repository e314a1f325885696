use crate::protocol::{expected_frame_length, MAX_RESPONSE_LENGTH};
use crate::Error;
use std::io::{self, Read};

/// Number of bytes still to read before `buffered` holds a complete reply.
///
/// Until the length field has arrived the target is [`MAX_RESPONSE_LENGTH`];
/// afterwards it is the declared frame length, capped at the same bound.
pub fn bytes_missing(buffered: &[u8]) -> usize {
    expected_frame_length(buffered)
        .unwrap_or(MAX_RESPONSE_LENGTH)
        .min(MAX_RESPONSE_LENGTH)
        .saturating_sub(buffered.len())
}

/// Reads one reply from `reader`.
///
/// Never asks for more bytes than the frame still needs, so data following a
/// complete frame stays in the reader. A read that times out or returns zero
/// bytes ends the reply; if nothing arrived at all the result is
/// [`Error::NoResponse`].
pub fn read_frame<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<u8>, Error> {
    let mut rx_buffer = Vec::with_capacity(MAX_RESPONSE_LENGTH);
    let mut chunk = [0; MAX_RESPONSE_LENGTH];

    loop {
        let missing = bytes_missing(&rx_buffer);
        if missing == 0 {
            break;
        }
        match reader.read(&mut chunk[..missing]) {
            Ok(0) => break,
            Ok(n) => rx_buffer.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                log::trace!("read timed out after {} bytes", rx_buffer.len());
                break;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }

    if rx_buffer.is_empty() {
        return Err(Error::NoResponse);
    }
    log::trace!("read_frame: {:02X?}", rx_buffer);
    Ok(rx_buffer)
}
