//! Mock adapters for integration tests.
//!
//! Records every publish so tests can assert on the full command history
//! without a broker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use soilgate::app::events::AppEvent;
use soilgate::app::ports::{Clock, CommandTransport, EventSink};
use soilgate::app::service::GatewayService;
use soilgate::config::GatewayConfig;
use soilgate::error::TransportError;

// ── MockTransport ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockTransport {
    pub payloads: Arc<Mutex<Vec<String>>>,
    pub fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn published(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl CommandTransport for MockTransport {
    fn publish(&mut self, _topic: &str, payload: &[u8], _timeout: Duration) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Timeout);
        }
        self.payloads
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(payload).into_owned());
        Ok(())
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Fixed wall clock.
pub struct MockClock {
    pub now: DateTime<Utc>,
    pub uptime: u64,
}

impl Default for MockClock {
    fn default() -> Self {
        Self {
            now: DateTime::UNIX_EPOCH + TimeDelta::seconds(1_700_000_000),
            uptime: 42,
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn uptime_secs(&self) -> u64 {
        self.uptime
    }
}

// ── NullSink ──────────────────────────────────────────────────

pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

pub fn make_service() -> (GatewayService<MockTransport>, MockTransport) {
    let transport = MockTransport::default();
    let service = GatewayService::new(GatewayConfig::default(), transport.clone()).unwrap();
    (service, transport)
}
