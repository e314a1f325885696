//! Provides a synchronous client for querying an ANT BMS over a serial port
//! using the `serialport` crate.
//!
//! # Example
//!
//! ```no_run
//! use antbms_lib::protocol::{read_request, Register};
//! use antbms_lib::serialport::{AntBms, Error};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Error> {
//!     let mut bms = AntBms::new("/dev/ttyUSB0", 9600)?;
//!     bms.set_timeout(Duration::from_secs(1))?;
//!
//!     let reply = bms.query(&read_request(Register::HardwareInfo))?;
//!     println!("checksum valid: {}", reply.checksum_valid());
//!     match reply.packet() {
//!         Ok(packet) => println!("{packet}"),
//!         Err(err) => println!("cannot parse reply: {err}"),
//!     }
//!     Ok(())
//! }
//! ```

use crate::protocol::*;
use crate::transport::read_frame;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Errors of the synchronous serial port client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable reply could be collected.
    #[error(transparent)]
    Bms(#[from] crate::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Synchronous connection to an ANT BMS.
///
/// Each [`query`](AntBms::query) performs exactly one send/receive cycle.
#[derive(Debug)]
pub struct AntBms {
    serial: Box<dyn serialport::SerialPort>,
    response_delay: Duration,
}

impl AntBms {
    /// Opens `port` with 8 data bits, no parity, one stop bit and no flow control.
    pub fn new(port: &str, baud_rate: u32) -> Result<Self> {
        log::debug!("open serial port '{}' at {} baud", port, baud_rate);
        Ok(Self {
            serial: serialport::new(port, baud_rate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .flow_control(serialport::FlowControl::None)
                .open()?,
            response_delay: Duration::ZERO,
        })
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        log::trace!("set timeout to {timeout:?}");
        Ok(self.serial.set_timeout(timeout)?)
    }

    /// Sets the pause between writing a request and starting to read the reply.
    pub fn set_response_delay(&mut self, delay: Duration) {
        log::trace!("set response delay to {delay:?}");
        self.response_delay = delay;
    }

    fn send_bytes(&mut self, tx_buffer: &[u8]) -> Result<()> {
        // clear all incoming serial to avoid data collision
        loop {
            let pending = self.serial.bytes_to_read()?;
            if pending > 0 {
                log::trace!("Got {} pending bytes", pending);
                let mut buf = [0; MAX_RESPONSE_LENGTH];
                let received = self.serial.read(&mut buf)?;
                log::trace!("Read {} pending bytes", received);
            } else {
                break;
            }
        }

        log::trace!("write bytes: {tx_buffer:02X?}");
        self.serial.write_all(tx_buffer)?;
        Ok(())
    }

    /// Sends `request` and collects the reply.
    ///
    /// Reading stops once a complete frame has arrived, after
    /// [`MAX_RESPONSE_LENGTH`] bytes, or when the timeout elapses. The reply is
    /// returned unvalidated.
    pub fn query(&mut self, request: &[u8]) -> Result<Reply> {
        self.send_bytes(request)?;
        if !self.response_delay.is_zero() {
            std::thread::sleep(self.response_delay);
        }
        Ok(Reply::new(read_frame(&mut self.serial)?))
    }
}
