use std::fmt;

/// Which of the two sentinel bytes of a frame failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Start,
    End,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Marker::Start => write!(f, "start"),
            Marker::End => write!(f, "end"),
        }
    }
}

/// Structural errors raised while parsing a received frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    /// The frame is shorter than the smallest parseable frame.
    #[error("frame too short: need at least {needed} bytes, got {len}")]
    TooShort { len: usize, needed: usize },
    /// The start or end byte does not carry the protocol marker.
    #[error("invalid {marker} marker: expected {expected:#04X}, found {found:#04X}")]
    BadMarker { marker: Marker, expected: u8, found: u8 },
    /// The declared data length runs into the checksum or past the end of the frame.
    #[error("declared data length {declared} exceeds the {available} bytes available")]
    TruncatedData { declared: u8, available: usize },
}

/// Errors raised while collecting a reply from a transport.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device did not send a single byte before the timeout elapsed.
    #[error("no response received from the BMS")]
    NoResponse,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
