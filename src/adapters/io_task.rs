//! Async I/O tasks: the telemetry consumer and the weather scheduler.
//!
//! Both run on `edge-executor` with `async-io-mini` timers, each in its
//! own thread:
//!
//! 1. **Telemetry** (`io-task`): the only future on its executor, woken
//!    by `TELEMETRY_CHANNEL.receive().await`.  The only consumer of the
//!    channel, so readings are ingested in arrival order.
//! 2. **Weather** (`weather-task`): ticks the [`Scheduler`] once per
//!    second.  The feed fetch blocks for up to the upstream timeout, so it
//!    never shares an executor with ingestion.
//!
//! ```text
//!  ┌───────────────────────────┐   ┌───────────────────────────┐
//!  │ io-task thread            │   │ weather-task thread       │
//!  │  LocalExecutor            │   │  LocalExecutor            │
//!  │  ┌─────────────────────┐  │   │  ┌─────────────────────┐  │
//!  │  │ Telemetry consumer  │  │   │  │ Scheduler tick 1s ⏱ │  │
//!  │  │ wake-on-send        │  │   │  │ → refresh_weather   │  │
//!  │  └─────────────────────┘  │   │  └─────────────────────┘  │
//!  └───────────────────────────┘   └───────────────────────────┘
//! ```

use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{error, info};

use crate::adapters::log_sink::LogEventSink;
use crate::app::ports::{Clock, CommandTransport, SchedulerDelegate, WeatherFeed};
use crate::app::service::GatewayService;
use crate::channels::TELEMETRY_CHANNEL;
use crate::scheduler::{Job, Scheduler};

/// Scheduler tick period.
const TICK: Duration = Duration::from_secs(1);

/// Label of the weather refresh job.
pub const WEATHER_SCHEDULE: &str = "weather-refresh";

// ── Scheduler delegate ───────────────────────────────────────

/// Bridges the scheduler to the weather cache: every time
/// [`WEATHER_SCHEDULE`] is due, one refresh runs against the feed.
pub struct WeatherRefreshDelegate<T, F, C> {
    service: Arc<GatewayService<T>>,
    feed: F,
    clock: Arc<C>,
}

impl<T, F, C> WeatherRefreshDelegate<T, F, C> {
    pub fn new(service: Arc<GatewayService<T>>, feed: F, clock: Arc<C>) -> Self {
        Self {
            service,
            feed,
            clock,
        }
    }
}

impl<T, F, C> SchedulerDelegate for WeatherRefreshDelegate<T, F, C>
where
    T: CommandTransport,
    F: WeatherFeed,
    C: Clock,
{
    fn on_due(&mut self, label: &str) {
        if label != WEATHER_SCHEDULE {
            return;
        }
        let mut sink = LogEventSink::new();
        // Failures are logged and counted by the service; the stale
        // snapshot stays until the next run.
        let _ = self
            .service
            .refresh_weather(&mut self.feed, self.clock.now(), &mut sink);
    }
}

/// Scheduler preloaded with the weather refresh: once at start, then
/// every `refresh_secs`.
pub fn weather_scheduler(refresh_secs: u32) -> Scheduler {
    let mut scheduler = Scheduler::new();
    let job = Job {
        label: WEATHER_SCHEDULE,
        every: Duration::from_secs(u64::from(refresh_secs)),
        immediate: true,
    };
    if let Err(job) = scheduler.add(job) {
        error!("No scheduler slot left for '{}'", job.label);
    }
    scheduler
}

// ── Async loops ──────────────────────────────────────────────

async fn telemetry_loop<T, C>(service: Arc<GatewayService<T>>, clock: Arc<C>)
where
    T: CommandTransport,
    C: Clock,
{
    let mut sink = LogEventSink::new();
    loop {
        let frame = TELEMETRY_CHANNEL.receive().await;
        service.ingest(&frame.payload, clock.now(), &mut sink);
    }
}

async fn scheduler_loop(mut scheduler: Scheduler, mut delegate: impl SchedulerDelegate) {
    loop {
        scheduler.tick(TICK, &mut delegate);
        async_io_mini::Timer::after(TICK).await;
    }
}

fn run_telemetry_loop<T, C>(service: Arc<GatewayService<T>>, clock: Arc<C>)
where
    T: CommandTransport,
    C: Clock,
{
    let executor: edge_executor::LocalExecutor<'_, 1> = edge_executor::LocalExecutor::new();
    executor.spawn(telemetry_loop(service, clock)).detach();
    info!("IO task started (telemetry consumer)");
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

fn run_weather_loop<T, F, C>(service: Arc<GatewayService<T>>, feed: F, clock: Arc<C>)
where
    T: CommandTransport,
    F: WeatherFeed,
    C: Clock,
{
    let refresh_secs = service.config().weather_refresh_secs;
    let delegate = WeatherRefreshDelegate::new(service, feed, clock);
    let executor: edge_executor::LocalExecutor<'_, 1> = edge_executor::LocalExecutor::new();
    executor
        .spawn(scheduler_loop(weather_scheduler(refresh_secs), delegate))
        .detach();
    info!("Weather task started (refresh every {}s)", refresh_secs);
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

// ── Thread spawn ─────────────────────────────────────────────

/// Spawn the telemetry consumer in a dedicated thread.
pub fn spawn<T, C>(service: Arc<GatewayService<T>>, clock: Arc<C>) -> std::io::Result<JoinHandle<()>>
where
    T: CommandTransport + Send + 'static,
    C: Clock + Send + Sync + 'static,
{
    std::thread::Builder::new()
        .name("io-task".into())
        .spawn(move || run_telemetry_loop(service, clock))
}

/// Spawn the weather refresh scheduler in a dedicated thread.
pub fn spawn_weather<T, F, C>(
    service: Arc<GatewayService<T>>,
    feed: F,
    clock: Arc<C>,
) -> std::io::Result<JoinHandle<()>>
where
    T: CommandTransport + Send + 'static,
    F: WeatherFeed + Send + 'static,
    C: Clock + Send + Sync + 'static,
{
    std::thread::Builder::new()
        .name("weather-task".into())
        .spawn(move || run_weather_loop(service, feed, clock))
}

// ── Tests ────────────────────────────────────────────────────
