//! Application service — the hexagonal core.
//!
//! [`GatewayService`] owns the telemetry store, the hysteresis controller,
//! the command publisher and the weather cache.  It exposes a clean,
//! transport-agnostic API; brokers, sockets and clocks stay behind the
//! port traits, so the whole service is testable with mock adapters.
//!
//! ```text
//!  telemetry ──▶ ┌──────────────────────────────┐ ──▶ CommandTransport
//!                │        GatewayService         │
//!  API ────────▶ │ Store · Controller · Publisher│ ──▶ EventSink
//!                └──────────────────────────────┘
//!  WeatherFeed ─▶        WeatherCache (own lock)
//! ```
//!
//! Store, controller and publisher live behind **one** mutex: the manual
//! and automation paths both read-then-write the cooldown timestamp, and
//! the automation path must finish its publish before the timestamp moves.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::config::GatewayConfig;
use crate::control::{AutomationOutcome, HysteresisController, Thresholds};
use crate::diagnostics::{Counter, Diagnostics, DiagnosticsReport};
use crate::error::{MalformedMessage, TransportError, UpstreamFetchError, ValidationError};
use crate::publisher::CommandPublisher;
use crate::telemetry::ingest::parse_reading;
use crate::telemetry::{PumpStatus, Reading, TelemetryStore};
use crate::weather::{WeatherCache, WeatherSnapshot};

use super::commands::{CommandSource, PumpCommand};
use super::events::AppEvent;
use super::ports::{CommandTransport, EventSink, WeatherFeed};

// ───────────────────────────────────────────────────────────────
// Query / outcome types
// ───────────────────────────────────────────────────────────────

/// What happened to one inbound telemetry message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Dropped; store and controller untouched.
    Rejected(MalformedMessage),
    /// Stored, then run through automation.
    Recorded(AutomationOutcome),
}

/// Latest reading plus controller status, as served by the API.
///
/// Reading fields are `null` (pump `UNKNOWN`) before the first message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestStatus {
    pub soil_moisture: Option<i64>,
    pub pump_status: PumpStatus,
    pub temperature: Option<f64>,
    pub humidity: Option<i32>,
    pub captured_at: Option<DateTime<Utc>>,
    pub last_command_time: Option<DateTime<Utc>>,
    pub cooldown_seconds: u32,
    pub cooldown_remaining_seconds: i64,
    pub automation_enabled: bool,
    pub dry_threshold: i64,
    pub wet_threshold: i64,
}

// ───────────────────────────────────────────────────────────────
// GatewayService
// ───────────────────────────────────────────────────────────────

struct GatewayState<T> {
    store: TelemetryStore,
    controller: HysteresisController,
    publisher: CommandPublisher<T>,
}

/// The application service orchestrates all gateway logic.
pub struct GatewayService<T> {
    state: Mutex<GatewayState<T>>,
    weather: WeatherCache,
    diagnostics: Diagnostics,
    config: GatewayConfig,
}

impl<T: CommandTransport> GatewayService<T> {
    /// Construct the service.  Rejects an invalid configuration.
    pub fn new(config: GatewayConfig, transport: T) -> Result<Self, ValidationError> {
        config.validate()?;
        let thresholds = Thresholds::new(config.dry_threshold, config.wet_threshold)?;
        let publisher = CommandPublisher::new(
            transport,
            config.mqtt.command_topic.clone(),
            core::time::Duration::from_millis(u64::from(config.mqtt.publish_timeout_ms)),
        );

        Ok(Self {
            state: Mutex::new(GatewayState {
                store: TelemetryStore::with_capacity(config.history_capacity),
                controller: HysteresisController::new(thresholds, config.cooldown_secs),
                publisher,
            }),
            weather: WeatherCache::new(),
            diagnostics: Diagnostics::new(),
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            dry_threshold: self.config.dry_threshold,
            wet_threshold: self.config.wet_threshold,
            cooldown_secs: self.config.cooldown_secs,
        });
        info!(
            "GatewayService started (dry>{} wet<{} cooldown={}s)",
            self.config.dry_threshold, self.config.wet_threshold, self.config.cooldown_secs
        );
    }

    // ── Telemetry / automation ────────────────────────────────

    /// Handle one raw telemetry payload received at `now`.
    ///
    /// Never fails: malformed payloads are logged, counted and dropped.
    pub fn ingest(&self, raw: &[u8], now: DateTime<Utc>, sink: &mut impl EventSink) -> IngestOutcome {
        let reading = match parse_reading(raw, now) {
            Ok(r) => r,
            Err(e) => {
                warn!("Dropping telemetry message: {}", e);
                self.diagnostics.bump(Counter::MessageRejected);
                sink.emit(&AppEvent::MessageRejected(e.clone()));
                return IngestOutcome::Rejected(e);
            }
        };

        let outcome = {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.store.record(reading.clone());
            state.controller.step(&reading, now, &mut state.publisher)
        };

        self.diagnostics.bump(Counter::MessageAccepted);
        sink.emit(&AppEvent::ReadingRecorded(reading));

        match &outcome {
            AutomationOutcome::CoolingDown { remaining } => {
                self.diagnostics.bump(Counter::CooldownSuppression);
                sink.emit(&AppEvent::CooldownActive {
                    remaining_secs: remaining.num_seconds(),
                });
            }
            AutomationOutcome::Hold => {}
            AutomationOutcome::Sent(command) => {
                self.diagnostics.bump(Counter::CommandSent);
                sink.emit(&AppEvent::CommandSent {
                    command: command.clone(),
                    source: CommandSource::Automation,
                });
            }
            AutomationOutcome::Failed(command, error) => {
                self.diagnostics.bump(Counter::PublishFailure);
                sink.emit(&AppEvent::CommandFailed {
                    command: command.clone(),
                    source: CommandSource::Automation,
                    error: error.clone(),
                });
            }
        }

        IngestOutcome::Recorded(outcome)
    }

    /// Operator override.  Always publishes and always resets the cooldown.
    pub fn manual_command(
        &self,
        command: PumpCommand,
        now: DateTime<Utc>,
        sink: &mut impl EventSink,
    ) -> Result<(), TransportError> {
        let result = {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.controller.manual(&command, now, &mut state.publisher)
        };

        match &result {
            Ok(()) => {
                self.diagnostics.bump(Counter::CommandSent);
                sink.emit(&AppEvent::CommandSent {
                    command,
                    source: CommandSource::Manual,
                });
            }
            Err(error) => {
                self.diagnostics.bump(Counter::PublishFailure);
                sink.emit(&AppEvent::CommandFailed {
                    command,
                    source: CommandSource::Manual,
                    error: error.clone(),
                });
            }
        }
        result
    }

    // ── Weather ───────────────────────────────────────────────

    pub fn refresh_weather(
        &self,
        feed: &mut impl WeatherFeed,
        now: DateTime<Utc>,
        sink: &mut impl EventSink,
    ) -> Result<(), UpstreamFetchError> {
        let result = self.weather.refresh(feed, now, sink);
        match &result {
            Ok(()) => self.diagnostics.bump(Counter::WeatherRefresh),
            Err(e) => {
                warn!("Weather refresh failed, keeping previous snapshot: {}", e);
                self.diagnostics.bump(Counter::WeatherFailure);
            }
        }
        result
    }

    pub fn weather(&self) -> WeatherSnapshot {
        self.weather.latest()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn latest_status(&self, now: DateTime<Utc>) -> LatestStatus {
        let state = self.lock();
        let latest = state.store.latest();
        let controller = &state.controller;

        LatestStatus {
            soil_moisture: latest.map(|r| r.soil_moisture),
            pump_status: latest.map_or(PumpStatus::Unknown, |r| r.pump_status),
            temperature: latest.and_then(|r| r.temperature),
            humidity: latest.and_then(|r| r.humidity),
            captured_at: latest.map(|r| r.captured_at),
            last_command_time: controller.last_command_at(),
            cooldown_seconds: self.config.cooldown_secs,
            cooldown_remaining_seconds: controller
                .cooldown_remaining(now)
                .map_or(0, |d| d.num_seconds()),
            automation_enabled: true,
            dry_threshold: controller.thresholds().dry(),
            wet_threshold: controller.thresholds().wet(),
        }
    }

    /// Most recent reading, if any.
    pub fn latest(&self) -> Option<Reading> {
        self.lock().store.latest().cloned()
    }

    /// Copy of the history ring, oldest first.
    pub fn history(&self) -> Vec<Reading> {
        self.lock().store.history()
    }

    pub fn last_command_at(&self) -> Option<DateTime<Utc>> {
        self.lock().controller.last_command_at()
    }

    pub fn diagnostics(&self, uptime_secs: u64) -> DiagnosticsReport {
        let last = self.lock().publisher.last_outcome().cloned();
        self.diagnostics.report(uptime_secs, last)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// A panic on another thread must not take the gateway down with it.
    fn lock(&self) -> MutexGuard<'_, GatewayState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
