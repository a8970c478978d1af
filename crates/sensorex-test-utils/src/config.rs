//! Config builders for tests.

use std::net::SocketAddr;
use std::path::PathBuf;

use sensorex_config::AppConfig;
use tempfile::TempDir;

/// An [`AppConfig`] pointed at a fake daemon address, with fast scrape
/// timeouts and an ephemeral HTTP listen port.
pub fn config_for_daemon(daemon_addr: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.listen_addr = "127.0.0.1:0".to_string();
    config.hddtemp.bind_addr = daemon_addr.ip().to_string();
    config.hddtemp.port = daemon_addr.port();
    config.hddtemp.connect_timeout_secs = 1;
    config.hddtemp.read_timeout_secs = 1;
    config.hddtemp.ready_attempts = 3;
    config.hddtemp.ready_delay_ms = 10;
    config
}

/// Write the given TOML into a temp directory and return the handle plus
/// the file path. The directory is deleted when the handle drops.
pub async fn write_config_file(toml_content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let path = temp_dir.path().join("sensorex.toml");
    tokio::fs::write(&path, toml_content)
        .await
        .expect("failed to write test config");
    (temp_dir, path)
}
