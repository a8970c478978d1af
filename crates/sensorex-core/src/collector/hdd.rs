//! Disk-temperature collector.
//!
//! Every scrape runs the full fetch → parse cycle against the hddtemp
//! daemon. A connection failure or a malformed reply degrades to an empty
//! family for that scrape; the endpoint stays healthy and other families
//! are unaffected.

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use tracing::{error, warn};

use crate::hddtemp::client::HddtempClient;
use crate::hddtemp::protocol;

use super::FamilySpec;

/// Collector for the disk-temperature gauge family.
pub struct HddCollector {
    client: HddtempClient,
    family: FamilySpec,
}

impl HddCollector {
    /// Create a collector scraping the daemon behind `client`.
    pub fn new(client: HddtempClient, family: FamilySpec) -> Self {
        Self { client, family }
    }
}

impl Collector for HddCollector {
    fn desc(&self) -> Vec<&Desc> {
        vec![self.family.desc()]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let raw = match self.client.fetch() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "error reading temps from hddtemp daemon");
                return Vec::new();
            }
        };
        let readings = match protocol::parse_reply(&raw) {
            Ok(readings) => readings,
            Err(e) => {
                warn!(error = %e, "error parsing temps from hddtemp daemon");
                return Vec::new();
            }
        };

        let gauge = match self.family.gauge() {
            Ok(gauge) => gauge,
            Err(e) => {
                error!(error = %e, "failed to build disk temperature family");
                return Vec::new();
            }
        };
        for reading in &readings {
            gauge
                .with_label_values(&[reading.device.as_str(), reading.id.as_str()])
                .set(reading.temperature_celsius);
        }
        gauge.collect()
    }
}
