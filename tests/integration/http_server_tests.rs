//! HTTP server adapter over real loopback sockets.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use soilgate::adapters::http_server::{self, MAX_CONNECTIONS};

use super::mocks::{MockClock, make_service};

fn start() -> (std::net::SocketAddr, super::mocks::MockTransport) {
    let (svc, transport) = make_service();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    http_server::spawn(listener, Arc::new(svc), Arc::new(MockClock::default())).unwrap();
    (addr, transport)
}

fn roundtrip(addr: std::net::SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request).unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    out
}

#[test]
fn serves_latest_over_tcp() {
    let (addr, _) = start();
    let resp = roundtrip(addr, b"GET /api/sensor/latest HTTP/1.1\r\nHost: gw\r\n\r\n");
    assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"), "{resp}");
    assert!(resp.contains("Connection: close"));
    assert!(resp.contains(r#""automationEnabled":true"#));
}

#[test]
fn manual_command_over_tcp() {
    let (addr, transport) = start();
    let body = r#"{"action":"TURN_PUMP_OFF"}"#;
    let req = format!(
        "POST /api/control/pump HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let resp = roundtrip(addr, req.as_bytes());
    assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"), "{resp}");
    assert_eq!(transport.published(), vec![r#"{"command":"TURN_PUMP_OFF"}"#]);
}

#[test]
fn garbage_request_gets_400() {
    let (addr, _) = start();
    let resp = roundtrip(addr, b"HELLO\r\n\r\n");
    assert!(resp.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{resp}");
}

#[test]
fn connections_past_the_cap_get_503_until_one_frees() {
    let (addr, _) = start();
    let idle: Vec<TcpStream> = (0..MAX_CONNECTIONS)
        .map(|_| TcpStream::connect(addr).unwrap())
        .collect();

    let mut extra = TcpStream::connect(addr).unwrap();
    let mut resp = String::new();
    extra.read_to_string(&mut resp).unwrap();
    assert!(resp.starts_with("HTTP/1.1 503 Service Unavailable\r\n"), "{resp}");
    assert!(resp.contains("too many connections"));

    drop(idle);
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    loop {
        // A refused attempt may be reset mid-read; only a 200 ends the loop.
        let mut stream = TcpStream::connect(addr).unwrap();
        let _ = stream.write_all(b"GET /api/health HTTP/1.1\r\n\r\n");
        let mut resp = String::new();
        let _ = stream.read_to_string(&mut resp);
        if resp.starts_with("HTTP/1.1 200 OK\r\n") {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "{resp}");
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
}
