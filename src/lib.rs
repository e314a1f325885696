#![cfg_attr(docsrs, feature(doc_cfg))]
//! # antbms_lib
//!
//! This crate provides a library for decoding the framed serial protocol spoken by
//! ANT BMS (Battery Management System) devices, plus optional clients that talk to a
//! device over a serial link.
//!
//! The protocol core ([`protocol`]) is pure: it takes a received byte buffer, answers
//! whether its checksum matches and slices it into command, status, length and data.
//!
//! ## Features
//!
//! - `default`: Enables `bin-dependencies`, which is intended for compiling the `antbms` command-line tool and pulls in `serialport` and `serde`.
//!
//! ### Client Features
//! - `serialport`: Enables the **synchronous** client using the `serialport` crate.
//! - `tokio-serial-async`: Enables the **asynchronous** client using `tokio` and `tokio-serial`.
//!
//! ### Utility Features
//! - `serde`: Enables `serde` serialization of parsed packets.
//! - `bin-dependencies`: Enables all features required by the `antbms` binary executable.

/// Rendering of parsed packets for humans.
pub mod display;
/// Contains error types for the library.
mod error;
/// Defines the framing and checksum of the ANT BMS protocol.
pub mod protocol;
/// Reply collection shared by the serial clients.
pub mod transport;

pub use error::{Error, FramingError, Marker};

/// Synchronous client for ANT BMS communication.
#[cfg_attr(docsrs, doc(cfg(feature = "serialport")))]
#[cfg(feature = "serialport")]
pub mod serialport;

/// Asynchronous client for ANT BMS communication.
#[cfg_attr(docsrs, doc(cfg(feature = "tokio-serial-async")))]
#[cfg(feature = "tokio-serial-async")]
pub mod tokio_serial_async;
