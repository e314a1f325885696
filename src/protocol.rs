use crate::{FramingError, Marker};
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

pub const START_BYTE: u8 = 0xdd;
pub const END_BYTE: u8 = 0x77;
pub const READ_COMMAND: u8 = 0xa5;
pub const STATUS_OK: u8 = 0x00;

/// start + command + status + length + checksum(2) + end
pub const MIN_FRAME_LENGTH: usize = 7;
/// Frames below this length never pass checksum verification.
pub const MIN_CHECKSUM_FRAME_LENGTH: usize = 6;
pub const DATA_OFFSET: usize = 4;
pub const CHECKSUM_LENGTH: usize = 2;
/// checksum(2) + end
const TRAILER_LENGTH: usize = CHECKSUM_LENGTH + 1;
/// Bytes covered by the checksum start after command and start byte.
const CHECKSUM_BODY_OFFSET: usize = 2;

pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Upper bound of bytes a client reads for a single response.
pub const MAX_RESPONSE_LENGTH: usize = 64;

/// Register addressed by a read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    HardwareInfo,
    Other(u8),
}

impl From<Register> for u8 {
    fn from(register: Register) -> Self {
        match register {
            Register::HardwareInfo => 0x05,
            Register::Other(address) => address,
        }
    }
}

impl From<u8> for Register {
    fn from(address: u8) -> Self {
        match address {
            0x05 => Register::HardwareInfo,
            other => Register::Other(other),
        }
    }
}

/// Computes the checksum over the interior bytes of a frame.
///
/// The value is `0x10000 - sum(body)`, truncated to 16 bits only after the
/// subtraction so that bodies summing to more than `0x10000` wrap instead of
/// saturating.
pub fn checksum(body: &[u8]) -> u16 {
    let sum: i64 = body.iter().map(|b| i64::from(*b)).sum();
    ((0x10000 - sum) & 0xffff) as u16
}

/// Checks the two checksum bytes in front of the end marker.
///
/// Returns `false` for frames shorter than [`MIN_CHECKSUM_FRAME_LENGTH`].
/// A mismatch is advisory, the frame may still be parsed.
pub fn verify_checksum(frame: &[u8]) -> bool {
    let len = frame.len();
    if len < MIN_CHECKSUM_FRAME_LENGTH {
        log::debug!("Frame too short for checksum - len={}", len);
        return false;
    }
    let calculated = checksum(&frame[CHECKSUM_BODY_OFFSET..len - TRAILER_LENGTH]).to_be_bytes();
    let received = &frame[len - TRAILER_LENGTH..len - 1];
    if calculated.as_slice() != received {
        log::debug!(
            "Invalid checksum - calculated={:02X?} received={:02X?} frame={:02X?}",
            calculated,
            received,
            frame
        );
        return false;
    }
    true
}

/// Read-only view over a received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Packet<'a> {
    pub command: u8,
    pub status: u8,
    pub data_length: u8,
    pub data: &'a [u8],
}

impl Packet<'_> {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

fn validate_len(frame: &[u8]) -> Result<(), FramingError> {
    if frame.len() < MIN_FRAME_LENGTH {
        return Err(FramingError::TooShort {
            len: frame.len(),
            needed: MIN_FRAME_LENGTH,
        });
    }
    Ok(())
}

fn validate_marker(marker: Marker, expected: u8, found: u8) -> Result<(), FramingError> {
    if found != expected {
        return Err(FramingError::BadMarker {
            marker,
            expected,
            found,
        });
    }
    Ok(())
}

/// Splits a frame into its fields.
///
/// The data region must end before the checksum bytes; a length byte that
/// claims more is rejected with [`FramingError::TruncatedData`]. Bytes between
/// the end of the data region and the checksum are not inspected.
pub fn parse_packet(frame: &[u8]) -> Result<Packet<'_>, FramingError> {
    validate_len(frame)?;
    validate_marker(Marker::Start, START_BYTE, frame[0])?;
    validate_marker(Marker::End, END_BYTE, frame[frame.len() - 1])?;

    let data_length = frame[3];
    let available = frame.len() - DATA_OFFSET - TRAILER_LENGTH;
    if usize::from(data_length) > available {
        return Err(FramingError::TruncatedData {
            declared: data_length,
            available,
        });
    }

    Ok(Packet {
        command: frame[1],
        status: frame[2],
        data_length,
        data: &frame[DATA_OFFSET..DATA_OFFSET + usize::from(data_length)],
    })
}

/// Builds a read request for `register`.
pub fn read_request(register: Register) -> Vec<u8> {
    let mut tx_buffer = vec![START_BYTE, READ_COMMAND, register.into(), 0x00];
    let crc = checksum(&tx_buffer[CHECKSUM_BODY_OFFSET..]);
    tx_buffer.extend_from_slice(&crc.to_be_bytes());
    tx_buffer.push(END_BYTE);
    tx_buffer
}

/// Total length of the frame whose first bytes are `prefix`, once the length
/// field has been received.
pub fn expected_frame_length(prefix: &[u8]) -> Option<usize> {
    prefix
        .get(3)
        .map(|n| DATA_OFFSET + usize::from(*n) + TRAILER_LENGTH)
}

/// A raw response as received from the device.
#[derive(Clone, PartialEq, Eq)]
pub struct Reply {
    pub raw: Vec<u8>,
}

impl Reply {
    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    pub fn checksum_valid(&self) -> bool {
        verify_checksum(&self.raw)
    }

    pub fn packet(&self) -> Result<Packet<'_>, FramingError> {
        parse_packet(&self.raw)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X?}", self.raw)
    }
}
