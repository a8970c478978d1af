//! hddtemp wire-format parser.
//!
//! A reply is `|`-framed and `||`-separated: each record carries exactly
//! four `|`-separated fields (device path, raw drive label, value, unit).
//! A unit of `*` marks a drive that does not report temperature (valid,
//! sentinel value). Any malformed record fails the whole batch: a partial
//! snapshot would be indistinguishable from a healthy small one.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static LABEL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w \t-]+").expect("label character class"));

/// Temperature reported for drives that do not support readout.
pub const UNSUPPORTED_SENTINEL: f64 = -1.0;

/// One decoded disk-temperature reading.
#[derive(Debug, Clone, PartialEq)]
pub struct HddReading {
    /// Device node path as reported by the daemon (e.g. `/dev/sda`).
    pub device: String,
    /// Sanitized drive identifier derived from the raw model label.
    pub id: String,
    /// Temperature in Celsius; [`UNSUPPORTED_SENTINEL`] if the drive
    /// cannot report one.
    pub temperature_celsius: f64,
}

/// Errors from decoding a daemon reply.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed reply envelope: {reply:?}")]
    Envelope { reply: String },

    #[error("expected 4 fields in record {record:?}, got {count}")]
    FieldCount { record: String, count: usize },

    #[error("unsupported unit {unit:?} in record {record:?}, only Celsius is understood")]
    Unit { unit: String, record: String },

    #[error("failed to parse temperature {value:?} as a float")]
    Temperature { value: String },
}

/// Decode a full daemon reply into readings, in input order.
///
/// Fails fast: the first malformed record invalidates the entire batch.
pub fn parse_reply(raw: &str) -> Result<Vec<HddReading>, ProtocolError> {
    let inner = raw
        .strip_prefix('|')
        .and_then(|rest| rest.strip_suffix('|'))
        .ok_or_else(|| ProtocolError::Envelope {
            reply: preview(raw),
        })?;

    inner.split("||").map(parse_record).collect()
}

fn parse_record(record: &str) -> Result<HddReading, ProtocolError> {
    let fields: Vec<&str> = record.split('|').collect();
    let [device, raw_label, value, unit] = fields[..] else {
        return Err(ProtocolError::FieldCount {
            record: record.to_string(),
            count: fields.len(),
        });
    };

    let id = LABEL_CHARS
        .find(raw_label)
        .map(|m| m.as_str().trim())
        .unwrap_or_default()
        .to_string();
    debug!(device, raw_label, value, unit, id = %id, "decoded record");

    if unit == "*" {
        return Ok(HddReading {
            device: device.to_string(),
            id,
            temperature_celsius: UNSUPPORTED_SENTINEL,
        });
    }

    if unit != "C" {
        return Err(ProtocolError::Unit {
            unit: unit.to_string(),
            record: record.to_string(),
        });
    }

    let temperature_celsius = value
        .parse::<f64>()
        .map_err(|_| ProtocolError::Temperature {
            value: value.to_string(),
        })?;

    Ok(HddReading {
        device: device.to_string(),
        id,
        temperature_celsius,
    })
}

/// Encode readings back into the wire framing.
///
/// The inverse of [`parse_reply`] for readings whose `id` stays within the
/// sanitized character class; used by test fixtures standing in for the
/// daemon.
pub fn encode_readings(readings: &[HddReading]) -> String {
    let body = readings
        .iter()
        .map(|r| {
            if r.temperature_celsius == UNSUPPORTED_SENTINEL {
                format!("{}|{}|0|*", r.device, r.id)
            } else {
                format!("{}|{}|{}|C", r.device, r.id, r.temperature_celsius)
            }
        })
        .collect::<Vec<_>>()
        .join("||");
    format!("|{body}|")
}

fn preview(raw: &str) -> String {
    const MAX: usize = 64;
    if raw.len() <= MAX {
        raw.to_string()
    } else {
        let mut end = MAX;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &raw[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_record() {
        let readings = parse_reply("|/dev/sda|WDC WD10|34|C|").unwrap();
        assert_eq!(
            readings,
            vec![HddReading {
                device: "/dev/sda".to_string(),
                id: "WDC WD10".to_string(),
                temperature_celsius: 34.0,
            }]
        );
    }

    #[test]
    fn test_two_records_with_sentinel() {
        let readings = parse_reply("|/dev/sda|WDC WD10|34|C||/dev/sdb|OldDrive|0|*|").unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].device, "/dev/sda");
        assert_eq!(readings[0].temperature_celsius, 34.0);
        assert_eq!(readings[1].device, "/dev/sdb");
        assert_eq!(readings[1].temperature_celsius, UNSUPPORTED_SENTINEL);
    }

    #[test]
    fn test_empty_reply_is_rejected() {
        assert!(matches!(
            parse_reply(""),
            Err(ProtocolError::Envelope { .. })
        ));
    }

    #[test]
    fn test_reply_without_leading_pipe_is_rejected() {
        assert!(matches!(
            parse_reply("/dev/sda|WDC|34|C|"),
            Err(ProtocolError::Envelope { .. })
        ));
    }

    #[test]
    fn test_bare_pipe_is_rejected() {
        assert!(matches!(
            parse_reply("|"),
            Err(ProtocolError::Envelope { .. })
        ));
    }

    #[test]
    fn test_foreign_unit_fails_the_whole_batch() {
        // First record is fine; the Fahrenheit record poisons the batch.
        let result = parse_reply("|/dev/sda|WDC WD10|34|C||/dev/sdb|Other|93|F|");
        assert!(matches!(result, Err(ProtocolError::Unit { .. })));
    }

    #[test]
    fn test_wrong_field_count_fails_the_batch() {
        let result = parse_reply("|/dev/sda|WDC WD10|34|");
        assert!(matches!(result, Err(ProtocolError::FieldCount { .. })));
    }

    #[test]
    fn test_unparseable_temperature_fails_the_batch() {
        let result = parse_reply("|/dev/sda|WDC WD10|warm|C|");
        assert!(matches!(result, Err(ProtocolError::Temperature { .. })));
    }

    #[test]
    fn test_label_sanitization_stops_at_disallowed_char_and_trims() {
        let readings = parse_reply("|/dev/sda|  WDC WD10 (bay-1)!! |34|C|").unwrap();
        assert_eq!(readings[0].id, "WDC WD10");
    }

    #[test]
    fn test_label_with_no_allowed_chars_yields_empty_id() {
        let readings = parse_reply("|/dev/sda|(((|34|C|").unwrap();
        assert_eq!(readings[0].id, "");
    }

    #[test]
    fn test_hyphens_and_tabs_survive_sanitization() {
        let readings = parse_reply("|/dev/sda|ST-3000\tDM001|34|C|").unwrap();
        assert_eq!(readings[0].id, "ST-3000\tDM001");
    }

    #[test]
    fn test_round_trip() {
        let original = vec![
            HddReading {
                device: "/dev/sda".to_string(),
                id: "WDC WD10EZEX".to_string(),
                temperature_celsius: 34.0,
            },
            HddReading {
                device: "/dev/sdb".to_string(),
                id: "ST3000DM001".to_string(),
                temperature_celsius: UNSUPPORTED_SENTINEL,
            },
            HddReading {
                device: "/dev/sdc".to_string(),
                id: "Samsung SSD 860".to_string(),
                temperature_celsius: 28.5,
            },
        ];
        let encoded = encode_readings(&original);
        let decoded = parse_reply(&encoded).unwrap();
        assert_eq!(decoded, original);
    }
}
