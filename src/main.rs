//! SoilGate gateway — main entry point.
//!
//! Hexagonal architecture: adapters on the outside, one shared
//! `GatewayService` in the middle.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  MqttTransport     LogEventSink   SystemClock   HttpWeatherFeed│
//! │  (CommandTransport)(EventSink)    (Clock)       (WeatherFeed)  │
//! │  mqtt-conn · io-task · weather-task · http-accept threads      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            GatewayService (pure logic)                 │    │
//! │  │  Store · Hysteresis · Publisher · WeatherCache         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use soilgate::adapters::log_sink::LogEventSink;
use soilgate::adapters::mqtt::{self, MqttTransport};
use soilgate::adapters::time::SystemClock;
use soilgate::adapters::weather_http::HttpWeatherFeed;
use soilgate::adapters::{http_server, io_task};
use soilgate::app::service::GatewayService;
use soilgate::config::GatewayConfig;
use soilgate::diagnostics;

fn main() -> Result<()> {
    // ── 1. Logging + panic hook ───────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    diagnostics::install_panic_handler();

    info!("SoilGate v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = GatewayConfig::load().context("loading configuration")?;

    // ── 3. Broker connection + service ────────────────────────
    let (client, connection) = mqtt::connect(&config.mqtt);
    let telemetry_topic = config.mqtt.telemetry_topic.clone();
    let http_bind = config.http_bind.clone();
    let feed = match HttpWeatherFeed::from_config(
        config.weather_url.as_deref(),
        Duration::from_millis(u64::from(config.upstream_timeout_ms)),
    ) {
        Ok(feed) => Some(feed),
        Err(e) => {
            warn!("Weather feed disabled: {}", e);
            None
        }
    };

    let service = Arc::new(
        GatewayService::new(config, MqttTransport::new(client.clone()))
            .map_err(soilgate::error::Error::from)
            .context("building gateway service")?,
    );
    let clock = Arc::new(SystemClock::new());
    service.start(&mut LogEventSink::new());

    // ── 4. Threads ────────────────────────────────────────────
    let mqtt_thread = mqtt::spawn_connection(connection, client, telemetry_topic)
        .context("spawning MQTT connection thread")?;
    let io_thread =
        io_task::spawn(Arc::clone(&service), Arc::clone(&clock)).context("spawning I/O task")?;
    let mut workers = vec![("mqtt", mqtt_thread), ("io", io_thread)];
    match feed {
        Some(feed) => {
            let weather_thread = io_task::spawn_weather(Arc::clone(&service), feed, Arc::clone(&clock))
                .context("spawning weather task")?;
            workers.push(("weather", weather_thread));
        }
        None => info!("No weather feed; /api/weather stays empty"),
    }

    let listener =
        TcpListener::bind(&http_bind).with_context(|| format!("binding HTTP API to {}", http_bind))?;
    workers.push((
        "http",
        http_server::spawn(listener, service, clock).context("spawning HTTP server")?,
    ));

    // ── 5. Park until a worker exits ──────────────────────────
    for (name, handle) in workers {
        if handle.join().is_err() {
            log::error!("{} thread panicked", name);
        }
    }
    anyhow::bail!("all worker threads exited")
}
