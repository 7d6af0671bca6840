//! Outbound application events.
//!
//! The [`GatewayService`](super::service::GatewayService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log them, forward them
//! to a dashboard, count them.

use crate::app::commands::{CommandSource, PumpCommand};
use crate::error::{MalformedMessage, TransportError, UpstreamFetchError};
use crate::telemetry::Reading;
use crate::weather::WeatherSnapshot;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service is up (carries the effective automation settings).
    Started {
        dry_threshold: i64,
        wet_threshold: i64,
        cooldown_secs: u32,
    },

    /// A telemetry message was accepted into the store.
    ReadingRecorded(Reading),

    /// A telemetry message was dropped.
    MessageRejected(MalformedMessage),

    /// Automation wanted to evaluate but the cooldown is still running.
    CooldownActive { remaining_secs: i64 },

    /// A command was accepted by the transport.
    CommandSent {
        command: PumpCommand,
        source: CommandSource,
    },

    /// A command could not be handed to the transport.
    CommandFailed {
        command: PumpCommand,
        source: CommandSource,
        error: TransportError,
    },

    /// The weather snapshot was replaced.
    WeatherUpdated(WeatherSnapshot),

    /// A weather refresh failed; the previous snapshot stays.
    WeatherFailed(UpstreamFetchError),
}
