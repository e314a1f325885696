//! Provides an asynchronous client for querying an ANT BMS (Battery Management System)
//! using Tokio and the `tokio-serial` crate for serial communication.
//!
//! This module is suitable for applications built on the Tokio runtime.
//!
//! # Example
//!
//! ```no_run
//! use antbms_lib::protocol::{read_request, Register};
//! use antbms_lib::tokio_serial_async::{AntBms, Error};
//! use std::time::Duration;
//!
//! async fn hardware_info() -> Result<(), Error> {
//!     let mut bms = AntBms::new("/dev/ttyUSB0", 9600)?;
//!     bms.set_timeout(Duration::from_secs(1));
//!
//!     let reply = bms.query(&read_request(Register::HardwareInfo)).await?;
//!     if !reply.checksum_valid() {
//!         println!("checksum mismatch");
//!     }
//!     match reply.packet() {
//!         Ok(packet) => println!("{packet}"),
//!         Err(err) => println!("cannot parse reply: {err}"),
//!     }
//!     Ok(())
//! }
//! ```

use crate::protocol::*;
use crate::transport::bytes_missing;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt};

/// Errors specific to the asynchronous Tokio serial port client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable reply could be collected.
    #[error(transparent)]
    Bms(#[from] crate::Error),
    /// An I/O error, typically from the serial port communication.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// An error from the `tokio-serial` crate.
    #[error("Tokio serial error: {0}")]
    TokioSerial(#[from] tokio_serial::Error),
    /// An error indicating that a Tokio timeout elapsed during an I/O operation.
    #[error("Tokio timeout elapsed: {0}")]
    TokioElapsed(#[from] tokio::time::error::Elapsed),
}

/// A specialized `Result` type for operations within the `tokio_serial_async` module.
type Result<T> = std::result::Result<T, Error>;

/// Asynchronous connection to an ANT BMS.
///
/// Each [`query`](AntBms::query) performs exactly one send/receive cycle; a caller
/// that wants to retry on a bad reply has to issue a new query.
#[derive(Debug)]
pub struct AntBms {
    serial: tokio_serial::SerialStream,
    io_timeout: Duration,
    response_delay: Duration,
}

impl AntBms {
    /// Opens `port` for asynchronous operation with 8 data bits, no parity,
    /// one stop bit and no flow control.
    pub fn new(port: &str, baud_rate: u32) -> Result<Self> {
        log::debug!("open serial port '{port}' at {baud_rate} baud");
        Ok(Self {
            serial: tokio_serial::new(port, baud_rate)
                .data_bits(tokio_serial::DataBits::Eight)
                .parity(tokio_serial::Parity::None)
                .stop_bits(tokio_serial::StopBits::One)
                .flow_control(tokio_serial::FlowControl::None)
                .open_native_async()?,
            io_timeout: Duration::from_secs(1),
            response_delay: Duration::ZERO,
        })
    }

    /// Sets the timeout for individual I/O operations (read/write) on the serial port.
    pub fn set_timeout(&mut self, timeout: Duration) {
        log::trace!("set timeout to {timeout:?}");
        self.io_timeout = timeout;
    }

    /// Sets the pause between writing a request and starting to read the reply.
    pub fn set_response_delay(&mut self, delay: Duration) {
        log::trace!("set response delay to {delay:?}");
        self.response_delay = delay;
    }

    async fn send_bytes(&mut self, tx_buffer: &[u8]) -> Result<()> {
        // A late reply to an earlier request must not be taken for the answer to this one.
        loop {
            let pending = self.serial.bytes_to_read()?;
            log::trace!("got {pending} pending bytes");
            if pending > 0 {
                let mut buf = [0; MAX_RESPONSE_LENGTH];
                let received =
                    tokio::time::timeout(self.io_timeout, self.serial.read(&mut buf)).await??;
                log::trace!("{received} pending bytes consumed");
            } else {
                break;
            }
        }

        log::trace!("write bytes: {tx_buffer:02X?}");
        tokio::time::timeout(self.io_timeout, self.serial.write_all(tx_buffer)).await??;
        Ok(())
    }

    async fn receive_bytes(&mut self) -> Result<Vec<u8>> {
        let mut rx_buffer = Vec::with_capacity(MAX_RESPONSE_LENGTH);
        let mut chunk = [0; MAX_RESPONSE_LENGTH];

        loop {
            let missing = bytes_missing(&rx_buffer);
            if missing == 0 {
                break;
            }
            let read = self.serial.read(&mut chunk[..missing]);
            match tokio::time::timeout(self.io_timeout, read).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => rx_buffer.extend_from_slice(&chunk[..n]),
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => {
                    log::trace!("read timed out after {} bytes", rx_buffer.len());
                    break;
                }
            }
        }

        if rx_buffer.is_empty() {
            return Err(crate::Error::NoResponse.into());
        }
        log::trace!("receive_bytes: {rx_buffer:02X?}");
        Ok(rx_buffer)
    }

    /// Sends `request` and collects the reply.
    ///
    /// Reading stops once a complete frame has arrived, after
    /// [`MAX_RESPONSE_LENGTH`] bytes, or when a read times out. The reply is
    /// returned unvalidated.
    pub async fn query(&mut self, request: &[u8]) -> Result<Reply> {
        self.send_bytes(request).await?;
        if !self.response_delay.is_zero() {
            tokio::time::sleep(self.response_delay).await;
        }
        Ok(Reply::new(self.receive_bytes().await?))
    }
}
