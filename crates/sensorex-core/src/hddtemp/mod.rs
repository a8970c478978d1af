//! hddtemp daemon integration.
//!
//! The daemon serves one full snapshot per TCP connection and then closes
//! it. [`client`] owns that connect/read/close cycle; [`protocol`] decodes
//! the raw reply text into typed readings.

pub mod client;
pub mod protocol;

pub use client::{ClientError, HddtempClient};
pub use protocol::{HddReading, ProtocolError, encode_readings, parse_reply};
