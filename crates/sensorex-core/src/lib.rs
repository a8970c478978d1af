#![deny(unsafe_code)]

//! sensorex core — sensor acquisition pipeline and metrics serving runtime.
//!
//! Supervises an external hddtemp daemon, scrapes it over its line-oriented
//! TCP protocol, enumerates hwmon chip sensors, and exposes both as
//! Prometheus gauge families over HTTP. The daemon module ties the pieces
//! together; everything below it is usable on its own.

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Prometheus collectors for chip and disk temperature readings.
pub mod collector;
/// Exporter daemon — startup sequencing, shutdown, and the run loop.
pub mod daemon;
/// Block-device discovery for the supervised daemon's argument list.
pub mod discovery;
/// hddtemp wire protocol client and parser.
pub mod hddtemp;
/// Chip sensor enumeration over the hwmon sysfs interface.
pub mod hwmon;
/// Metrics HTTP server (exposition endpoint, readiness, landing page).
pub mod server;
/// Lifecycle supervision of the external hddtemp process.
pub mod supervisor;

/// In-crate test fixtures (unit tests only).
#[cfg(test)]
mod test_support;

pub use daemon::{Daemon, DaemonError, ShutdownSignal};
pub use hddtemp::protocol::HddReading;
pub use hwmon::{Chip, ChipEnumerator, Feature};
