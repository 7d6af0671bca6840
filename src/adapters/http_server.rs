//! HTTP API server adapter.
//!
//! A `std::net::TcpListener` accept loop.  Each connection gets its own
//! thread, carries exactly one request, and is closed after the response.
//! At most [`MAX_CONNECTIONS`] are served at once; the rest get a 503.
//! Decoding lives in [`crate::api::http`]; routing in [`crate::api::dispatch`].

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::json;

use crate::adapters::log_sink::LogEventSink;
use crate::api::http::{RequestDecoder, encode_response};
use crate::api::{self, ApiResponse};
use crate::app::ports::{Clock, CommandTransport};
use crate::app::service::GatewayService;

/// Read timeout per connection.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

const READ_BUF_SIZE: usize = 1024;

/// Connections served concurrently before new ones are turned away.
pub const MAX_CONNECTIONS: usize = 32;

/// Counts connection threads in flight.
struct ConnectionGate {
    live: Arc<AtomicUsize>,
    limit: usize,
}

impl ConnectionGate {
    fn new(limit: usize) -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(0)),
            limit,
        }
    }

    fn try_acquire(&self) -> Option<ConnectionSlot> {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.limit).then_some(n + 1)
            })
            .ok()?;
        Some(ConnectionSlot {
            live: Arc::clone(&self.live),
        })
    }
}

/// Held by a connection thread; frees its place on drop.
struct ConnectionSlot {
    live: Arc<AtomicUsize>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Read one request from `stream`, dispatch it, write the response.
pub fn handle_connection<S, T, C>(stream: &mut S, service: &GatewayService<T>, clock: &C)
where
    S: Read + Write,
    T: CommandTransport,
    C: Clock,
{
    let mut decoder = RequestDecoder::new();
    let mut buf = [0u8; READ_BUF_SIZE];

    let response = loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => {
                debug!("HTTP: peer closed before a full request");
                return;
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("HTTP: read failed: {}", e);
                return;
            }
        };
        match decoder.feed(&buf[..n]) {
            Ok(Some(req)) => {
                debug!("HTTP: {:?} {}", req.method, req.path);
                let mut sink = LogEventSink::new();
                break api::dispatch(service, &req, clock.now(), clock.uptime_secs(), &mut sink);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("HTTP: {}", e);
                break ApiResponse {
                    status: e.status(),
                    body: json!({ "success": false, "error": e.to_string() }),
                };
            }
        }
    };

    let bytes = encode_response(response.status, &response.body);
    if let Err(e) = stream.write_all(&bytes).and_then(|()| stream.flush()) {
        debug!("HTTP: write failed: {}", e);
    }
}

/// Spawn the accept loop on its own thread.
pub fn spawn<T, C>(
    listener: TcpListener,
    service: Arc<GatewayService<T>>,
    clock: Arc<C>,
) -> std::io::Result<JoinHandle<()>>
where
    T: CommandTransport + Send + 'static,
    C: Clock + Send + Sync + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP: listening on {}", addr);
    }
    std::thread::Builder::new()
        .name("http-accept".into())
        .spawn(move || {
            let gate = ConnectionGate::new(MAX_CONNECTIONS);
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => match gate.try_acquire() {
                        Some(slot) => {
                            serve_detached(stream, slot, Arc::clone(&service), Arc::clone(&clock))
                        }
                        None => reject_busy(stream),
                    },
                    Err(e) => warn!("HTTP: accept failed: {}", e),
                }
            }
        })
}

fn reject_busy(mut stream: TcpStream) {
    warn!("HTTP: {} connections in flight, answering 503", MAX_CONNECTIONS);
    let bytes = encode_response(
        503,
        &json!({ "success": false, "error": "too many connections" }),
    );
    let written = stream
        .set_write_timeout(Some(READ_TIMEOUT))
        .and_then(|()| stream.write_all(&bytes));
    if let Err(e) = written {
        debug!("HTTP: 503 write failed: {}", e);
    }
}

fn serve_detached<T, C>(
    mut stream: TcpStream,
    slot: ConnectionSlot,
    service: Arc<GatewayService<T>>,
    clock: Arc<C>,
) where
    T: CommandTransport + Send + 'static,
    C: Clock + Send + Sync + 'static,
{
    if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
        warn!("HTTP: set_read_timeout failed: {}", e);
        return;
    }
    let spawned = std::thread::Builder::new()
        .name("http-conn".into())
        .spawn(move || {
            let _slot = slot;
            handle_connection(&mut stream, &service, clock.as_ref());
        });
    if let Err(e) = spawned {
        warn!("HTTP: could not spawn connection thread: {}", e);
    }
}
