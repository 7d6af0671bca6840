//! Soil/climate telemetry: the reading model, the bounded store, and the
//! parser that turns raw transport payloads into readings.

pub mod ingest;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use store::{HISTORY_CAPACITY, TelemetryStore};

/// Pump state as reported by the field node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PumpStatus {
    On,
    Off,
    /// Not reported, or a value we do not recognise.
    #[default]
    Unknown,
}

impl PumpStatus {
    /// Map a wire string (`"ON"` / `"OFF"`, any case) to a status.
    /// Anything else is [`PumpStatus::Unknown`].
    pub fn from_wire(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("on") {
            Self::On
        } else if raw.eq_ignore_ascii_case("off") {
            Self::Off
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A point-in-time sensor snapshot.  Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Raw sensor units, higher = drier (practically 0–1023).
    pub soil_moisture: i64,
    pub pump_status: PumpStatus,
    /// Air temperature (°C).
    pub temperature: Option<f64>,
    /// Relative humidity (%).
    pub humidity: Option<i32>,
    /// Ingestion time, not sensor time.
    pub captured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pump_status_from_wire() {
        assert_eq!(PumpStatus::from_wire("ON"), PumpStatus::On);
        assert_eq!(PumpStatus::from_wire(" off "), PumpStatus::Off);
        assert_eq!(PumpStatus::from_wire("Running"), PumpStatus::Unknown);
        assert_eq!(PumpStatus::from_wire(""), PumpStatus::Unknown);
    }

    #[test]
    fn reading_serialises_camel_case() {
        let r = Reading {
            soil_moisture: 512,
            pump_status: PumpStatus::Off,
            temperature: None,
            humidity: Some(40),
            captured_at: DateTime::UNIX_EPOCH,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["soilMoisture"], 512);
        assert_eq!(v["pumpStatus"], "OFF");
        assert!(v["temperature"].is_null());
        assert_eq!(v["humidity"], 40);
        assert_eq!(v["capturedAt"], "1970-01-01T00:00:00Z");
    }
}
