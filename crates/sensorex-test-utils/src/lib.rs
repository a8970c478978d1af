#![deny(unsafe_code)]

//! Shared test utilities for the sensorex workspace.
//!
//! Provides reusable fixtures, config builders, and tracing helpers so that
//! individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! sensorex-test-utils = { workspace = true }
//! ```

pub mod chips;
pub mod config;
pub mod hddtemp;
pub mod tracing_setup;
