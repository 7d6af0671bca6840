//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade, one tag-prefixed line per event.  A dashboard push
//! adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                dry_threshold,
                wet_threshold,
                cooldown_secs,
            } => {
                info!(
                    "START | dry>{} wet<{} cooldown={}s",
                    dry_threshold, wet_threshold, cooldown_secs
                );
            }
            AppEvent::ReadingRecorded(r) => {
                info!(
                    "TELEM | moisture={} | pump={} | T={} | RH={}",
                    r.soil_moisture,
                    r.pump_status.as_str(),
                    r.temperature
                        .map_or_else(|| "-".into(), |t| format!("{:.1}\u{00b0}C", t)),
                    r.humidity.map_or_else(|| "-".into(), |h| format!("{}%", h)),
                );
            }
            AppEvent::MessageRejected(e) => {
                warn!("TELEM | rejected: {}", e);
            }
            AppEvent::CooldownActive { remaining_secs } => {
                info!("COOLDOWN | {}s remaining, automation held", remaining_secs);
            }
            AppEvent::CommandSent { command, source } => {
                info!("CMD | {} sent ({:?})", command, source);
            }
            AppEvent::CommandFailed {
                command,
                source,
                error,
            } => {
                warn!("CMD | {} failed ({:?}): {}", command, source, error);
            }
            AppEvent::WeatherUpdated(w) => {
                info!(
                    "WEATHER | {} | {} | T={}",
                    w.location.as_deref().unwrap_or("?"),
                    w.description.as_deref().unwrap_or("-"),
                    w.temperature
                        .map_or_else(|| "-".into(), |t| format!("{:.1}\u{00b0}C", t)),
                );
            }
            AppEvent::WeatherFailed(e) => {
                warn!("WEATHER | refresh failed: {}", e);
            }
        }
    }
}
