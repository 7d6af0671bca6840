//! Port traits — the hexagonal boundary between gateway logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GatewayService (domain)
//! ```
//!
//! Driven adapters (MQTT client, weather HTTP client, clock, log sink)
//! implement these traits.  The [`GatewayService`](super::service::GatewayService)
//! consumes them via generics, so the domain core never touches a socket
//! directly.

use core::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{TransportError, UpstreamFetchError};

// ───────────────────────────────────────────────────────────────
// Command transport (driven adapter: domain → pub/sub broker)
// ───────────────────────────────────────────────────────────────

/// Write-side port for pump commands.
///
/// Delivery is at-most-once: `Ok(())` means the transport accepted the
/// message, not that the actuator acted on it.
pub trait CommandTransport {
    /// Publish `payload` on `topic`, giving up after `timeout`.
    fn publish(&mut self, topic: &str, payload: &[u8], timeout: Duration)
    -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Weather feed (driven adapter: external HTTP API → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the external weather feed.
pub trait WeatherFeed {
    /// Fetch the raw response body of the current-weather endpoint.
    fn fetch(&mut self) -> Result<Vec<u8>, UpstreamFetchError>;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Wall-clock source.  Tests substitute a fixed or stepped clock.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Seconds since the gateway started.
    fn uptime_secs(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the work it triggers)
// ───────────────────────────────────────────────────────────────

/// Receives the label of each job the scheduler finds due.
///
/// The weather task implements this by refreshing the weather cache; the
/// scheduler itself knows nothing about feeds or the service.
pub trait SchedulerDelegate {
    fn on_due(&mut self, label: &str);
}
