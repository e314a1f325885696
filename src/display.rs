use crate::protocol::Packet;
use std::fmt;

/// Human readable form of a data region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadText {
    /// Every byte was printable ASCII.
    Ascii(String),
    /// Space separated uppercase hex, used when any byte is not printable.
    Hex(String),
}

impl fmt::Display for PayloadText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadText::Ascii(text) => write!(f, "Data (ASCII): {text}"),
            PayloadText::Hex(text) => write!(f, "Data (Hex): {text}"),
        }
    }
}

fn is_printable(byte: u8) -> bool {
    (0x20..=0x7e).contains(&byte)
}

pub fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn decode_payload(data: &[u8]) -> PayloadText {
    match ascii_str(data) {
        Some(text) => PayloadText::Ascii(text.to_owned()),
        None => PayloadText::Hex(hex_string(data)),
    }
}

fn ascii_str(data: &[u8]) -> Option<&str> {
    if data.iter().all(|b| is_printable(*b)) {
        // printable ASCII is always valid UTF-8
        std::str::from_utf8(data).ok()
    } else {
        None
    }
}

impl Packet<'_> {
    /// The data region as text, if every byte is printable ASCII.
    pub fn data_ascii(&self) -> Option<&str> {
        ascii_str(self.data)
    }

    pub fn data_hex(&self) -> String {
        hex_string(self.data)
    }

    pub fn payload_text(&self) -> PayloadText {
        decode_payload(self.data)
    }
}

impl fmt::Display for Packet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parsed Packet:")?;
        writeln!(f, "  Command ID: 0x{:02X}", self.command)?;
        writeln!(f, "  Status: 0x{:02X}", self.status)?;
        writeln!(f, "  Data Length: {}", self.data_length)?;
        write!(f, "  {}", self.payload_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_data_is_ascii() {
        assert_eq!(decode_payload(&[0x41, 0x42]), PayloadText::Ascii("AB".into()));
        assert_eq!(decode_payload(b"BMS V1.0"), PayloadText::Ascii("BMS V1.0".into()));
    }

    #[test]
    fn binary_data_falls_back_to_hex() {
        assert_eq!(decode_payload(&[0x00, 0xff]), PayloadText::Hex("00 FF".into()));
        // one control byte is enough
        assert_eq!(
            decode_payload(&[0x41, 0x0a]),
            PayloadText::Hex("41 0A".into())
        );
    }

    #[test]
    fn empty_data_is_empty_ascii() {
        assert_eq!(decode_payload(&[]), PayloadText::Ascii(String::new()));
        assert_eq!(hex_string(&[]), "");
    }

    #[test]
    fn both_representations_available() {
        let packet = Packet {
            command: 0x05,
            status: 0x00,
            data_length: 2,
            data: b"AB",
        };
        assert_eq!(packet.data_ascii(), Some("AB"));
        assert_eq!(packet.data_hex(), "41 42");
    }

    #[test]
    fn render_packet() {
        let packet = Packet {
            command: 0x0a,
            status: 0x80,
            data_length: 2,
            data: &[0x00, 0xff],
        };
        assert_eq!(
            packet.to_string(),
            "Parsed Packet:\n  Command ID: 0x0A\n  Status: 0x80\n  Data Length: 2\n  Data (Hex): 00 FF"
        );
        assert_eq!(packet.data_ascii(), None);
    }
}
