//! MQTT adapter.
//!
//! [`MqttTransport`] implements [`CommandTransport`] over a `rumqttc`
//! synchronous client.  [`spawn_connection`] runs the client's event loop
//! on a dedicated thread: it re-subscribes to the telemetry topic on every
//! ConnAck (the broker may have dropped the session) and pushes inbound
//! payloads into the telemetry channel.
//!
//! Publishing uses QoS 0 through `try_publish`, which never blocks on the
//! event loop.  A full request queue is retried until the publish timeout
//! elapses.  Success means the command was queued, not that it reached
//! the broker; the queue is kept short so a dead connection shows up as
//! a timeout after a handful of commands.

use core::time::Duration;
use std::thread::JoinHandle;
use std::time::Instant;

use log::{error, info, warn};
use rumqttc::{Client, ClientError, Connection, Event, MqttOptions, Packet, QoS};

use crate::app::ports::CommandTransport;
use crate::channels;
use crate::config::MqttConfig;
use crate::error::TransportError;

/// Request queue capacity between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 4;

/// Back-off after a connection error before the event loop reconnects.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Poll interval while waiting for room in the request queue.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Create the client handle and its connection from config.
pub fn connect(config: &MqttConfig) -> (Client, Connection) {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    info!(
        "MQTT: connecting to {}:{} as '{}'",
        config.host, config.port, config.client_id
    );
    Client::new(options, REQUEST_CAPACITY)
}

/// Command publisher side of the MQTT client.
///
/// `publish` returns `Ok` once the request is in the client queue.  QoS 0
/// has no broker acknowledgement, so delivery is never confirmed; while
/// the broker is unreachable up to `REQUEST_CAPACITY` commands are
/// accepted and later ones fail with [`TransportError::Timeout`].
pub struct MqttTransport {
    client: Client,
}

impl MqttTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl CommandTransport for MqttTransport {
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .client
                .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            {
                Ok(()) => return Ok(()),
                Err(ClientError::TryRequest(_)) if Instant::now() < deadline => {
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Err(ClientError::TryRequest(_)) => return Err(TransportError::Timeout),
                Err(e) => return Err(TransportError::Client(e.to_string())),
            }
        }
    }
}

/// Spawn the connection thread.  It runs for the life of the process.
pub fn spawn_connection(
    mut connection: Connection,
    client: Client,
    telemetry_topic: String,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("mqtt-conn".into())
        .spawn(move || {
            for event in connection.iter() {
                match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT: connected, subscribing to '{}'", telemetry_topic);
                        if let Err(e) = client.try_subscribe(&telemetry_topic, QoS::AtMostOnce) {
                            error!("MQTT: subscribe to '{}' failed: {}", telemetry_topic, e);
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(p))) => {
                        if p.topic == telemetry_topic {
                            channels::push_telemetry(&p.payload);
                        } else {
                            warn!("MQTT: unhandled topic '{}'", p.topic);
                        }
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("MQTT: broker disconnected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT: connection error: {}, retrying in {:?}", e, RECONNECT_DELAY);
                        std::thread::sleep(RECONNECT_DELAY);
                    }
                }
            }
            error!("MQTT: event loop ended");
        })
}
