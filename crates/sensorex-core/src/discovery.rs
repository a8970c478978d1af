//! Block-device discovery.
//!
//! Scans the device directory once at startup for whole-disk SCSI/SATA
//! nodes (`sda`, `sdb`, …) to hand to the hddtemp daemon as positional
//! arguments. Partitions (`sda1`) and other node types never match.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

static DEVICE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^sd[a-z]+$").expect("device name pattern"));

/// Errors from device discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to list device directory {dir}: {source}")]
    ListDir {
        dir: PathBuf,
        source: std::io::Error,
    },
}

/// Scan `dev_dir` for whole-disk device nodes, sorted by name.
///
/// A directory that cannot be listed is a fatal startup condition for the
/// exporter: without a device list there is nothing to hand the daemon.
pub fn discover_devices(dev_dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let entries = fs::read_dir(dev_dir).map_err(|source| DiscoveryError::ListDir {
        dir: dev_dir.to_path_buf(),
        source,
    })?;

    let mut devices = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::ListDir {
            dir: dev_dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if DEVICE_NAME.is_match(name) {
            let path = dev_dir.join(name);
            info!(device = %path.display(), "discovered HDD");
            devices.push(path);
        }
    }
    devices.sort();
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_discovers_whole_disks_only() {
        let tmp = TempDir::new().unwrap();
        for name in ["sda", "sdb", "sdaa", "sda1", "sdB", "nvme0n1", "loop0", "sr0"] {
            touch(tmp.path(), name);
        }

        let devices = discover_devices(tmp.path()).unwrap();
        let names: Vec<_> = devices
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["sda", "sdaa", "sdb"]);
    }

    #[test]
    fn test_empty_directory_yields_no_devices() {
        let tmp = TempDir::new().unwrap();
        assert!(discover_devices(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = discover_devices(Path::new("/nonexistent/device/dir"));
        assert!(matches!(result, Err(DiscoveryError::ListDir { .. })));
    }

    #[test]
    fn test_returned_paths_are_joined_to_dir() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "sda");

        let devices = discover_devices(tmp.path()).unwrap();
        assert_eq!(devices, vec![tmp.path().join("sda")]);
    }
}
