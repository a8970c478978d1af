#![deny(unsafe_code)]

//! Configuration loading and validation for the sensorex exporter.
//!
//! Loads TOML configuration files and validates them against expected
//! schemas. Provides the [`AppConfig`] type as the central configuration
//! structure; command-line flags override individual fields after loading.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP serving configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Supervised hddtemp daemon configuration.
    #[serde(default)]
    pub hddtemp: HddtempConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the metrics HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address on which to expose metrics and the web interface.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path under which to expose metrics.
    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            telemetry_path: default_telemetry_path(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:9255".to_string()
}

fn default_telemetry_path() -> String {
    "/metrics".to_string()
}

/// Configuration for the supervised hddtemp daemon and its reply channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HddtempConfig {
    /// Name (or path) of the hddtemp executable, resolved on PATH at startup.
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Loopback address the daemon is told to bind.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// TCP port the daemon is told to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory scanned for block devices to hand to the daemon.
    #[serde(default = "default_device_dir")]
    pub device_dir: String,

    /// Connect timeout for each scrape connection, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Read timeout for each scrape connection, in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Number of startup readiness probes before giving up on the daemon.
    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,

    /// Delay between readiness probes, in milliseconds.
    #[serde(default = "default_ready_delay_ms")]
    pub ready_delay_ms: u64,
}

impl Default for HddtempConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            bind_addr: default_bind_addr(),
            port: default_port(),
            device_dir: default_device_dir(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            ready_attempts: default_ready_attempts(),
            ready_delay_ms: default_ready_delay_ms(),
        }
    }
}

impl HddtempConfig {
    /// The socket address the daemon serves snapshots on.
    pub fn daemon_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|e| ConfigError::Validation(format!("invalid hddtemp address: {e}")))
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Delay between readiness probes as a [`Duration`].
    pub fn ready_delay(&self) -> Duration {
        Duration::from_millis(self.ready_delay_ms)
    }
}

fn default_executable() -> String {
    "hddtemp".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7777
}

fn default_device_dir() -> String {
    "/dev".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    10
}

fn default_ready_attempts() -> u32 {
    10
}

fn default_ready_delay_ms() -> u64 {
    200
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_addr.is_empty() {
            return Err(ConfigError::Validation(
                "server.listen_addr must not be empty".to_string(),
            ));
        }
        if !self.server.telemetry_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "server.telemetry_path must start with '/', got {:?}",
                self.server.telemetry_path
            )));
        }
        if self.hddtemp.executable.is_empty() {
            return Err(ConfigError::Validation(
                "hddtemp.executable must not be empty".to_string(),
            ));
        }
        if self.hddtemp.port == 0 {
            return Err(ConfigError::Validation(
                "hddtemp.port must be non-zero".to_string(),
            ));
        }
        if self.hddtemp.device_dir.is_empty() {
            return Err(ConfigError::Validation(
                "hddtemp.device_dir must not be empty".to_string(),
            ));
        }
        if self.hddtemp.ready_attempts == 0 {
            return Err(ConfigError::Validation(
                "hddtemp.ready_attempts must be at least 1".to_string(),
            ));
        }
        self.hddtemp.daemon_addr()?;
        Ok(())
    }
}
