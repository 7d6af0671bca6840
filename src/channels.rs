//! Inter-thread telemetry queue.
//!
//! Uses an `embassy-sync` bounded channel to bridge the MQTT connection
//! thread (producer) and the I/O task's telemetry consumer.  The consumer
//! is the only reader, so messages are ingested one at a time in arrival
//! order.
//!
//! ```text
//! ┌──────────────┐ TelemetryFrame ┌────────────────────┐
//! │ MQTT thread  │──────────────▶│ I/O task consumer  │──▶ GatewayService::ingest
//! └──────────────┘               └────────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use log::warn;

use crate::telemetry::ingest::MAX_PAYLOAD_LEN;

/// One raw telemetry payload as received from the broker.
pub struct TelemetryFrame {
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

/// Channel depth for inbound telemetry.
const TELEMETRY_DEPTH: usize = 32;

pub static TELEMETRY_CHANNEL: Channel<CriticalSectionRawMutex, TelemetryFrame, TELEMETRY_DEPTH> =
    Channel::new();

/// Queue a payload for ingestion.  Returns `false` (and logs) when the
/// payload is oversize or the queue is full.
pub fn push_telemetry(payload: &[u8]) -> bool {
    let mut frame = TelemetryFrame { payload: Vec::new() };
    if frame.payload.extend_from_slice(payload).is_err() {
        warn!(
            "Telemetry payload of {} bytes exceeds {} byte frame, dropping",
            payload.len(),
            MAX_PAYLOAD_LEN
        );
        return false;
    }
    if TELEMETRY_CHANNEL.try_send(frame).is_err() {
        warn!("Telemetry channel full, dropping message");
        return false;
    }
    true
}

/// Non-blocking receive.
#[cfg(test)]
fn try_recv_telemetry() -> Option<TelemetryFrame> {
    TELEMETRY_CHANNEL.try_receive().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The channel is a process-wide static; keep every assertion that
    // touches it inside one test so parallel tests cannot interleave.
    #[test]
    fn queue_preserves_order_and_bounds() {
        while try_recv_telemetry().is_some() {}

        assert!(!push_telemetry(&[b'x'; MAX_PAYLOAD_LEN + 1]));

        for i in 0..TELEMETRY_DEPTH {
            assert!(push_telemetry(format!("{{\"soilMoisture\":{}}}", i).as_bytes()));
        }
        assert!(!push_telemetry(b"{}"));

        for i in 0..TELEMETRY_DEPTH {
            let frame = try_recv_telemetry().unwrap();
            assert_eq!(frame.payload.as_slice(), format!("{{\"soilMoisture\":{}}}", i).as_bytes());
        }
        assert!(try_recv_telemetry().is_none());
    }
}
