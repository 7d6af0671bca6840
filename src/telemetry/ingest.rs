//! Telemetry payload parser.
//!
//! Wire format (JSON object, extra keys ignored):
//! ```text
//! { "soilMoisture": 612, "pumpStatus": "OFF", "temperature": 21.4, "humidity": 55 }
//! ```
//!
//! `soilMoisture` is required.  `pumpStatus` falls back to `UNKNOWN`;
//! `temperature` and `humidity` become absent when missing or not numeric.
//! Numbers may also arrive as numeric strings (`"21.4"`).

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{PumpStatus, Reading};
use crate::error::MalformedMessage;

/// Largest payload accepted from the transport.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// Parse a raw payload into a [`Reading`] stamped with `captured_at`.
pub fn parse_reading(raw: &[u8], captured_at: DateTime<Utc>) -> Result<Reading, MalformedMessage> {
    if raw.len() > MAX_PAYLOAD_LEN {
        return Err(MalformedMessage::Oversize(raw.len()));
    }

    let value: Value =
        serde_json::from_slice(raw).map_err(|e| MalformedMessage::NotJson(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(MalformedMessage::NotAnObject);
    };

    let soil_moisture = match fields.get("soilMoisture") {
        None | Some(Value::Null) => return Err(MalformedMessage::MissingMoisture),
        Some(v) => numeric(v).ok_or(MalformedMessage::InvalidMoisture)?,
    };

    Ok(Reading {
        soil_moisture: soil_moisture.round() as i64,
        pump_status: pump_status(&fields),
        temperature: fields.get("temperature").and_then(numeric),
        humidity: fields
            .get("humidity")
            .and_then(numeric)
            .map(|h| h.round() as i32),
        captured_at,
    })
}

fn pump_status(fields: &Map<String, Value>) -> PumpStatus {
    match fields.get("pumpStatus") {
        Some(Value::String(s)) => PumpStatus::from_wire(s),
        _ => PumpStatus::Unknown,
    }
}

/// Finite number from a JSON number or numeric string.
fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}
