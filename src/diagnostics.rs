//! Runtime diagnostics.
//!
//! Lock-free counters bumped on the ingest, command and weather paths,
//! and a serialisable report assembled on demand for the API.  A panic
//! hook logs the panic reason before the default handler runs.

use core::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::publisher::PublishRecord;

/// Counters shared by every thread in the gateway.
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages_accepted: AtomicU64,
    messages_rejected: AtomicU64,
    commands_sent: AtomicU64,
    publish_failures: AtomicU64,
    cooldown_suppressions: AtomicU64,
    weather_refreshes: AtomicU64,
    weather_failures: AtomicU64,
}

/// Which counter to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    MessageAccepted,
    MessageRejected,
    CommandSent,
    PublishFailure,
    CooldownSuppression,
    WeatherRefresh,
    WeatherFailure,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self, counter: Counter) {
        self.slot(counter).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    /// Point-in-time report.
    pub fn report(&self, uptime_secs: u64, last_publish: Option<PublishRecord>) -> DiagnosticsReport {
        DiagnosticsReport {
            uptime_secs,
            messages_accepted: self.get(Counter::MessageAccepted),
            messages_rejected: self.get(Counter::MessageRejected),
            commands_sent: self.get(Counter::CommandSent),
            publish_failures: self.get(Counter::PublishFailure),
            cooldown_suppressions: self.get(Counter::CooldownSuppression),
            weather_refreshes: self.get(Counter::WeatherRefresh),
            weather_failures: self.get(Counter::WeatherFailure),
            last_publish,
        }
    }

    fn slot(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::MessageAccepted => &self.messages_accepted,
            Counter::MessageRejected => &self.messages_rejected,
            Counter::CommandSent => &self.commands_sent,
            Counter::PublishFailure => &self.publish_failures,
            Counter::CooldownSuppression => &self.cooldown_suppressions,
            Counter::WeatherRefresh => &self.weather_refreshes,
            Counter::WeatherFailure => &self.weather_failures,
        }
    }
}

/// Diagnostics snapshot returned by `GET /api/diagnostics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    pub uptime_secs: u64,
    pub messages_accepted: u64,
    pub messages_rejected: u64,
    pub commands_sent: u64,
    pub publish_failures: u64,
    pub cooldown_suppressions: u64,
    pub weather_refreshes: u64,
    pub weather_failures: u64,
    pub last_publish: Option<PublishRecord>,
}

/// Install a panic hook that logs the panic reason through `log`
/// before delegating to the previous hook.
pub fn install_panic_handler() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();

        log::error!("PANIC: {} at {}", reason, location);
        previous(info);
    }));
}
