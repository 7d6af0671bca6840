//! Gateway configuration parameters
//!
//! All tunable parameters for the gateway.  Defaults match the field
//! deployment; values can be overridden from a JSON file and from
//! `SOILGATE_*` environment variables.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::telemetry::HISTORY_CAPACITY;

/// Environment variable naming the optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "SOILGATE_CONFIG";

/// Longest cooldown accepted (one day).
const MAX_COOLDOWN_SECS: u32 = 86_400;

/// MQTT connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Topic carrying sensor telemetry (subscribe)
    pub telemetry_topic: String,
    /// Topic carrying pump commands (publish)
    pub command_topic: String,
    /// Upper bound on a single command publish
    pub publish_timeout_ms: u32,
    pub keep_alive_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 1883,
            client_id: "soilgate".into(),
            telemetry_topic: "sensor/telemetry".into(),
            command_topic: "actuator/command".into(),
            publish_timeout_ms: 2000,
            keep_alive_secs: 30,
        }
    }
}

/// Core gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    // --- Automation ---
    /// Moisture reading above which the soil counts as dry (pump ON)
    pub dry_threshold: i64,
    /// Moisture reading below which the soil counts as wet (pump OFF)
    pub wet_threshold: i64,
    /// Minimum seconds between two pump commands
    pub cooldown_secs: u32,

    // --- Telemetry ---
    /// Number of readings kept in the history ring
    pub history_capacity: usize,

    // --- Weather ---
    /// Plain-HTTP feed URL (OpenWeatherMap current-weather format)
    pub weather_url: Option<String>,
    /// Weather refresh interval (seconds)
    pub weather_refresh_secs: u32,
    /// Connect + read timeout for the weather feed (milliseconds)
    pub upstream_timeout_ms: u32,

    // --- Interfaces ---
    pub mqtt: MqttConfig,
    /// Listen address of the HTTP API
    pub http_bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            // Automation
            dry_threshold: 700,
            wet_threshold: 400,
            cooldown_secs: 30,

            // Telemetry
            history_capacity: HISTORY_CAPACITY,

            // Weather
            weather_url: None,
            weather_refresh_secs: 600, // 10 min
            upstream_timeout_ms: 5000,

            // Interfaces
            mqtt: MqttConfig::default(),
            http_bind: "0.0.0.0:3000".into(),
        }
    }
}

impl GatewayConfig {
    /// Reject out-of-range values.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dry_threshold <= self.wet_threshold {
            return Err(ValidationError::Config(
                "dry_threshold must be above wet_threshold",
            ));
        }
        if self.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(ValidationError::Config("cooldown_secs exceeds one day"));
        }
        if self.history_capacity == 0 || self.history_capacity > HISTORY_CAPACITY {
            return Err(ValidationError::Config(
                "history_capacity must be between 1 and 200",
            ));
        }
        if self.weather_refresh_secs == 0 {
            return Err(ValidationError::Config("weather_refresh_secs must be non-zero"));
        }
        if self.mqtt.publish_timeout_ms == 0 {
            return Err(ValidationError::Config("publish_timeout_ms must be non-zero"));
        }
        if self.mqtt.telemetry_topic.is_empty() || self.mqtt.command_topic.is_empty() {
            return Err(ValidationError::Config("mqtt topics must not be empty"));
        }
        Ok(())
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(bytes).map_err(|e| ValidationError::InvalidBody(e.to_string()))
    }

    /// Apply `SOILGATE_*` overrides.  `lookup` is `std::env::var` in
    /// production; unparseable numbers are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("SOILGATE_MQTT_HOST") {
            self.mqtt.host = host;
        }
        override_parsed(&lookup, "SOILGATE_MQTT_PORT", &mut self.mqtt.port);
        if let Some(bind) = lookup("SOILGATE_HTTP_BIND") {
            self.http_bind = bind;
        }
        if let Some(url) = lookup("SOILGATE_WEATHER_URL") {
            self.weather_url = Some(url).filter(|u| !u.is_empty());
        }
        override_parsed(&lookup, "SOILGATE_DRY_THRESHOLD", &mut self.dry_threshold);
        override_parsed(&lookup, "SOILGATE_WET_THRESHOLD", &mut self.wet_threshold);
        override_parsed(&lookup, "SOILGATE_COOLDOWN_SECS", &mut self.cooldown_secs);
    }

    /// Load from `$SOILGATE_CONFIG` (if set), apply env overrides, validate.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let bytes = std::fs::read(&path)
                    .map_err(|e| anyhow::anyhow!("reading config '{}': {}", path, e))?;
                log::info!("Config loaded from {}", path);
                Self::from_json(&bytes).map_err(|e| anyhow::anyhow!("{}", e))?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

fn override_parsed<T: core::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(v) => *slot = v,
            Err(_) => log::warn!("Ignoring {}={:?}: not a number", key, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_sane() {
        let c = GatewayConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.dry_threshold, 700);
        assert_eq!(c.wet_threshold, 400);
        assert_eq!(c.cooldown_secs, 30);
        assert_eq!(c.history_capacity, 200);
        assert_eq!(c.weather_refresh_secs, 600);
    }

    #[test]
    fn dry_above_wet_invariant() {
        let c = GatewayConfig {
            dry_threshold: 400,
            wet_threshold: 400,
            ..GatewayConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(ValidationError::Config(
                "dry_threshold must be above wet_threshold"
            ))
        );
    }

    #[test]
    fn history_capacity_bounds() {
        let mut c = GatewayConfig::default();
        c.history_capacity = 0;
        assert!(c.validate().is_err());
        c.history_capacity = HISTORY_CAPACITY + 1;
        assert!(c.validate().is_err());
        c.history_capacity = 10;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = GatewayConfig::from_json(br#"{"dry_threshold": 800, "mqtt": {"port": 8883}}"#)
            .unwrap();
        assert_eq!(c.dry_threshold, 800);
        assert_eq!(c.wet_threshold, 400);
        assert_eq!(c.mqtt.port, 8883);
        assert_eq!(c.mqtt.telemetry_topic, "sensor/telemetry");
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("SOILGATE_MQTT_HOST", "broker.local"),
            ("SOILGATE_MQTT_PORT", "not-a-port"),
            ("SOILGATE_COOLDOWN_SECS", "45"),
            ("SOILGATE_WEATHER_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut c = GatewayConfig::default();
        c.weather_url = Some("http://example.invalid/".into());
        c.apply_env(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(c.mqtt.host, "broker.local");
        assert_eq!(c.mqtt.port, 1883);
        assert_eq!(c.cooldown_secs, 45);
        assert_eq!(c.weather_url, None);
    }

    #[test]
    fn serde_roundtrip() {
        let c = GatewayConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2 = GatewayConfig::from_json(json.as_bytes()).unwrap();
        assert_eq!(c, c2);
    }
}
