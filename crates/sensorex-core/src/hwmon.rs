//! Chip sensor enumeration over the hwmon sysfs interface.
//!
//! Each `/sys/class/hwmon/hwmonN` directory is one chip: its `name`
//! attribute names the driver, the `device` symlink identifies the bus
//! adaptor, and every `<feature>_input` attribute is one measurable
//! quantity. hwmon reports integers in fixed sub-units (milli-degrees,
//! milli-volts, micro-watts); values are scaled to base units here so the
//! collectors never see raw sysfs integers.
//!
//! Enumeration failures are never fatal: a chip or attribute that cannot
//! be read is skipped for this scrape and retried on the next one.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// One measurable quantity exposed by a chip (e.g. one fan input).
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Attribute name without the `_input` suffix (e.g. `temp1`, `fan2`).
    pub name: String,
    /// Human-readable label from `<feature>_label`, or the attribute name.
    pub label: String,
    /// Value scaled to base units (celsius, rpm, volts, watts).
    pub value: f64,
}

/// One hardware sensor chip and its current feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct Chip {
    /// Driver name from the chip's `name` attribute.
    pub name: String,
    /// Bus adaptor identity from the chip's `device` symlink.
    pub adaptor: String,
    /// Current features, sorted by name.
    pub features: Vec<Feature>,
}

/// Source of chip sensor readings, enumerated fresh on every scrape.
pub trait ChipEnumerator: Send + Sync {
    /// Currently detected chips with current feature values.
    fn chips(&self) -> Vec<Chip>;
}

/// [`ChipEnumerator`] backed by the hwmon sysfs tree.
#[derive(Debug, Clone)]
pub struct HwmonEnumerator {
    base: PathBuf,
}

impl HwmonEnumerator {
    /// Enumerate chips from the standard sysfs location.
    pub fn new() -> Self {
        Self::with_base("/sys/class/hwmon")
    }

    /// Enumerate chips from an alternate tree root (used by tests).
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn read_chip(&self, dir: &Path) -> Option<Chip> {
        let name = read_attr(&dir.join("name"))
            .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))?;
        let adaptor = adaptor_name(dir);

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(chip = %dir.display(), error = %e, "skipping unreadable hwmon entry");
                return None;
            }
        };

        let mut features = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(feature) = file_name.strip_suffix("_input") else {
                continue;
            };
            let Some(raw) = read_attr(&entry.path()) else {
                continue;
            };
            let Ok(raw) = raw.parse::<f64>() else {
                debug!(chip = %name, feature, raw = %raw, "skipping unparseable feature value");
                continue;
            };
            let label =
                read_attr(&dir.join(format!("{feature}_label"))).unwrap_or_else(|| feature.to_string());
            features.push(Feature {
                name: feature.to_string(),
                label,
                value: raw / scale_for(feature),
            });
        }
        features.sort_by(|a, b| a.name.cmp(&b.name));

        Some(Chip {
            name,
            adaptor,
            features,
        })
    }
}

impl Default for HwmonEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipEnumerator for HwmonEnumerator {
    fn chips(&self) -> Vec<Chip> {
        let entries = match fs::read_dir(&self.base) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(base = %self.base.display(), error = %e, "no hwmon tree available");
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("hwmon"))
            })
            .collect();
        dirs.sort();

        dirs.iter()
            .filter_map(|dir| self.read_chip(dir))
            .collect()
    }
}

fn read_attr(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn adaptor_name(dir: &Path) -> String {
    fs::read_link(dir.join("device"))
        .ok()
        .and_then(|target| target.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "virtual".to_string())
}

/// Divisor converting a feature's raw sysfs integer to base units.
fn scale_for(feature: &str) -> f64 {
    if feature.starts_with("temp") || feature.starts_with("in") || feature.starts_with("curr") {
        1000.0
    } else if feature.starts_with("power") || feature.starts_with("energy") {
        1_000_000.0
    } else {
        1.0
    }
}
