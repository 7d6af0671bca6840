//! Weather cache.
//!
//! Holds the last good snapshot of the external feed.  A failed refresh
//! leaves the previous snapshot in place; nothing expires.  The cache has
//! its own lock and never touches controller state.
//!
//! The feed body is expected in the OpenWeatherMap current-weather shape:
//! ```text
//! { "name": "Lyon", "main": { "temp": 18.2, "feels_like": 17.9, "humidity": 61, "pressure": 1016 },
//!   "weather": [ { "description": "light rain" } ], "wind": { "speed": 3.6 } }
//! ```

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, WeatherFeed};
use crate::error::UpstreamFetchError;

/// Latest weather.  Every field is `None` before the first success.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub location: Option<String>,
    /// °C
    pub temperature: Option<f64>,
    /// °C
    pub feels_like: Option<f64>,
    /// %
    pub humidity: Option<i32>,
    /// hPa
    pub pressure: Option<f64>,
    pub description: Option<String>,
    /// m/s
    pub wind_speed: Option<f64>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Decode a feed body into a snapshot stamped `fetched_at`.
pub fn parse_feed_body(
    body: &[u8],
    fetched_at: DateTime<Utc>,
) -> Result<WeatherSnapshot, UpstreamFetchError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| UpstreamFetchError::Body(e.to_string()))?;
    let main = value
        .get("main")
        .filter(|m| m.is_object())
        .ok_or_else(|| UpstreamFetchError::Body("missing 'main' object".into()))?;

    Ok(WeatherSnapshot {
        location: value.get("name").and_then(Value::as_str).map(str::to_string),
        temperature: main.get("temp").and_then(Value::as_f64),
        feels_like: main.get("feels_like").and_then(Value::as_f64),
        humidity: main
            .get("humidity")
            .and_then(Value::as_f64)
            .map(|h| h.round() as i32),
        pressure: main.get("pressure").and_then(Value::as_f64),
        description: value
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
            .map(str::to_string),
        wind_speed: value.pointer("/wind/speed").and_then(Value::as_f64),
        fetched_at: Some(fetched_at),
    })
}

#[derive(Default)]
pub struct WeatherCache {
    snapshot: RwLock<WeatherSnapshot>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and decode; replace the snapshot only on success.
    pub fn refresh(
        &self,
        feed: &mut impl WeatherFeed,
        now: DateTime<Utc>,
        sink: &mut impl EventSink,
    ) -> Result<(), UpstreamFetchError> {
        match feed.fetch().and_then(|body| parse_feed_body(&body, now)) {
            Ok(snapshot) => {
                *self
                    .snapshot
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
                sink.emit(&AppEvent::WeatherUpdated(snapshot));
                Ok(())
            }
            Err(e) => {
                sink.emit(&AppEvent::WeatherFailed(e.clone()));
                Err(e)
            }
        }
    }

    /// Copy of the current snapshot (possibly stale).
    pub fn latest(&self) -> WeatherSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Vec<Result<Vec<u8>, UpstreamFetchError>>);

    impl WeatherFeed for Scripted {
        fn fetch(&mut self) -> Result<Vec<u8>, UpstreamFetchError> {
            self.0.remove(0)
        }
    }

    struct Null;
    impl EventSink for Null {
        fn emit(&mut self, _event: &AppEvent) {}
    }

    const BODY: &[u8] = br#"{"name":"Lyon","main":{"temp":18.2,"feels_like":17.9,"humidity":61,"pressure":1016},
        "weather":[{"description":"light rain"}],"wind":{"speed":3.6}}"#;

    #[test]
    fn parses_openweathermap_body() {
        let s = parse_feed_body(BODY, DateTime::UNIX_EPOCH).unwrap();
        assert_eq!(s.location.as_deref(), Some("Lyon"));
        assert_eq!(s.temperature, Some(18.2));
        assert_eq!(s.humidity, Some(61));
        assert_eq!(s.description.as_deref(), Some("light rain"));
        assert_eq!(s.wind_speed, Some(3.6));
        assert_eq!(s.fetched_at, Some(DateTime::UNIX_EPOCH));
    }

    #[test]
    fn body_without_main_is_rejected() {
        assert!(matches!(
            parse_feed_body(br#"{"cod":401,"message":"Invalid API key"}"#, DateTime::UNIX_EPOCH),
            Err(UpstreamFetchError::Body(_))
        ));
    }

    #[test]
    fn empty_before_first_success() {
        let cache = WeatherCache::new();
        assert_eq!(cache.latest(), WeatherSnapshot::default());
        let v = serde_json::to_value(cache.latest()).unwrap();
        assert!(v.as_object().unwrap().values().all(Value::is_null));
    }

    #[test]
    fn failure_keeps_stale_snapshot() {
        let cache = WeatherCache::new();
        let mut feed = Scripted(vec![
            Ok(BODY.to_vec()),
            Err(UpstreamFetchError::Status(503)),
            Ok(b"<html>".to_vec()),
        ]);

        cache.refresh(&mut feed, DateTime::UNIX_EPOCH, &mut Null).unwrap();
        let good = cache.latest();

        assert_eq!(
            cache.refresh(&mut feed, DateTime::UNIX_EPOCH, &mut Null),
            Err(UpstreamFetchError::Status(503))
        );
        assert!(cache.refresh(&mut feed, DateTime::UNIX_EPOCH, &mut Null).is_err());
        assert_eq!(cache.latest(), good);
    }
}
