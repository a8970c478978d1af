//! Chip sensor collector.
//!
//! Routes each enumerated feature into one of four gauge families by name
//! prefix: `fan`, `temp`, `in` (voltage), `power`. Features matching no
//! prefix (`pwm1`, alarms, …) are skipped without comment; they are not an
//! error, just not something this exporter publishes.

use prometheus::GaugeVec;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use tracing::error;

use crate::hwmon::ChipEnumerator;

use super::ChipFamilySpecs;

/// Collector for the four chip-sensor gauge families.
pub struct ChipCollector<E> {
    enumerator: E,
    specs: ChipFamilySpecs,
}

struct ChipGauges {
    fan_speed: GaugeVec,
    voltage: GaugeVec,
    power: GaugeVec,
    temperature: GaugeVec,
}

impl ChipGauges {
    fn for_feature(&self, name: &str) -> Option<&GaugeVec> {
        if name.starts_with("fan") {
            Some(&self.fan_speed)
        } else if name.starts_with("temp") {
            Some(&self.temperature)
        } else if name.starts_with("in") {
            Some(&self.voltage)
        } else if name.starts_with("power") {
            Some(&self.power)
        } else {
            None
        }
    }
}

impl<E: ChipEnumerator> ChipCollector<E> {
    /// Create a collector over the given chip source.
    pub fn new(enumerator: E, specs: ChipFamilySpecs) -> Self {
        Self { enumerator, specs }
    }

    fn fresh_gauges(&self) -> Result<ChipGauges, prometheus::Error> {
        Ok(ChipGauges {
            fan_speed: self.specs.fan_speed.gauge()?,
            voltage: self.specs.voltage.gauge()?,
            power: self.specs.power.gauge()?,
            temperature: self.specs.temperature.gauge()?,
        })
    }
}

impl<E: ChipEnumerator> Collector for ChipCollector<E> {
    fn desc(&self) -> Vec<&Desc> {
        vec![
            self.specs.fan_speed.desc(),
            self.specs.power.desc(),
            self.specs.temperature.desc(),
            self.specs.voltage.desc(),
        ]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let gauges = match self.fresh_gauges() {
            Ok(gauges) => gauges,
            Err(e) => {
                error!(error = %e, "failed to build chip sensor families");
                return Vec::new();
            }
        };

        for chip in self.enumerator.chips() {
            for feature in &chip.features {
                let Some(gauge) = gauges.for_feature(&feature.name) else {
                    continue;
                };
                gauge
                    .with_label_values(&[
                        feature.label.as_str(),
                        chip.name.as_str(),
                        chip.adaptor.as_str(),
                    ])
                    .set(feature.value);
            }
        }

        [
            gauges.fan_speed,
            gauges.voltage,
            gauges.power,
            gauges.temperature,
        ]
        .into_iter()
        .flat_map(|gauge| gauge.collect())
        .filter(|family| !family.get_metric().is_empty())
        .collect()
    }
}
