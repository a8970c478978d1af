//! Prometheus collectors for the two acquisition paths.
//!
//! Both collectors implement [`prometheus::core::Collector`]: `desc()`
//! advertises the static metric families, `collect()` acquires fresh
//! readings on every scrape. Family metadata is built once at startup via
//! [`FamilySpec`] values and handed into the collector constructors;
//! nothing metric-shaped lives in global state.

pub mod chips;
pub mod hdd;

use std::collections::HashMap;

use prometheus::core::Desc;
use prometheus::{GaugeVec, Opts, Registry};

pub use chips::ChipCollector;
pub use hdd::HddCollector;

/// Metric name and label constants, kept bit-identical to the exporter's
/// published series for dashboard compatibility.
pub const FAN_SPEED_NAME: &str = "sensor_lm_fan_speed_rpm";
pub const FAN_SPEED_HELP: &str = "fan speed (rotations per minute).";
pub const FAN_SPEED_LABELS: &[&str] = &["fantype", "chip", "adaptor"];

pub const VOLTAGE_NAME: &str = "sensor_lm_voltage_volts";
pub const VOLTAGE_HELP: &str = "voltage in volts";
pub const VOLTAGE_LABELS: &[&str] = &["intype", "chip", "adaptor"];

pub const POWER_NAME: &str = "sensor_lm_power_watts";
pub const POWER_HELP: &str = "power in watts";
pub const POWER_LABELS: &[&str] = &["powertype", "chip", "adaptor"];

pub const TEMPERATURE_NAME: &str = "sensor_lm_temperature_celsius";
pub const TEMPERATURE_HELP: &str = "temperature in celsius";
pub const TEMPERATURE_LABELS: &[&str] = &["temptype", "chip", "adaptor"];

pub const HDD_TEMPERATURE_NAME: &str = "sensor_hddsmart_temperature_celsius";
pub const HDD_TEMPERATURE_HELP: &str = "temperature in celsius";
pub const HDD_TEMPERATURE_LABELS: &[&str] = &["device", "id"];

/// Immutable metadata for one gauge family.
///
/// Validated once at construction; `gauge()` mints a fresh, empty family
/// for the current scrape so no label set survives across scrapes.
#[derive(Debug, Clone)]
pub struct FamilySpec {
    opts: Opts,
    desc: Desc,
    labels: &'static [&'static str],
}

impl FamilySpec {
    /// Build and validate the family metadata.
    pub fn new(
        name: &str,
        help: &str,
        labels: &'static [&'static str],
    ) -> Result<Self, prometheus::Error> {
        let desc = Desc::new(
            name.to_string(),
            help.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;
        Ok(Self {
            opts: Opts::new(name, help),
            desc,
            labels,
        })
    }

    /// The advertised descriptor for this family.
    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub(crate) fn gauge(&self) -> Result<GaugeVec, prometheus::Error> {
        GaugeVec::new(self.opts.clone(), self.labels)
    }
}

/// The disk-temperature family descriptor.
pub fn hdd_family_spec() -> Result<FamilySpec, prometheus::Error> {
    FamilySpec::new(
        HDD_TEMPERATURE_NAME,
        HDD_TEMPERATURE_HELP,
        HDD_TEMPERATURE_LABELS,
    )
}

/// The four chip-sensor family descriptors.
#[derive(Debug, Clone)]
pub struct ChipFamilySpecs {
    pub fan_speed: FamilySpec,
    pub voltage: FamilySpec,
    pub power: FamilySpec,
    pub temperature: FamilySpec,
}

impl ChipFamilySpecs {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            fan_speed: FamilySpec::new(FAN_SPEED_NAME, FAN_SPEED_HELP, FAN_SPEED_LABELS)?,
            voltage: FamilySpec::new(VOLTAGE_NAME, VOLTAGE_HELP, VOLTAGE_LABELS)?,
            power: FamilySpec::new(POWER_NAME, POWER_HELP, POWER_LABELS)?,
            temperature: FamilySpec::new(TEMPERATURE_NAME, TEMPERATURE_HELP, TEMPERATURE_LABELS)?,
        })
    }
}

/// Register both collectors into a fresh registry.
///
/// Registration completes before the HTTP endpoint is brought up, so a
/// scrape can never observe a half-populated registry.
pub fn build_registry(
    hdd: HddCollector,
    chips: ChipCollector<impl crate::hwmon::ChipEnumerator + 'static>,
) -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    registry.register(Box::new(hdd))?;
    registry.register(Box::new(chips))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_spec_rejects_invalid_metric_name() {
        let result = FamilySpec::new("not a metric name", "help", &["label"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_family_spec_desc_carries_labels() {
        let spec = hdd_family_spec().unwrap();
        assert_eq!(spec.desc().fq_name, HDD_TEMPERATURE_NAME);
        assert_eq!(spec.desc().variable_labels, vec!["device", "id"]);
    }

    #[test]
    fn test_chip_family_specs_build() {
        let specs = ChipFamilySpecs::new().unwrap();
        assert_eq!(specs.fan_speed.desc().fq_name, FAN_SPEED_NAME);
        assert_eq!(specs.voltage.desc().fq_name, VOLTAGE_NAME);
        assert_eq!(specs.power.desc().fq_name, POWER_NAME);
        assert_eq!(specs.temperature.desc().fq_name, TEMPERATURE_NAME);
    }
}
