//! Weather feed adapter.
//!
//! Implements [`WeatherFeed`] with a one-shot HTTP/1.0 GET over
//! `std::net::TcpStream`.  Only plain `http://` URLs are supported; put a
//! local proxy in front of a TLS-only provider.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::app::ports::WeatherFeed;
use crate::error::UpstreamFetchError;

/// Largest response accepted from the feed.
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Parsed `http://host[:port]/path?query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUrl {
    pub host: String,
    pub port: u16,
    /// Path plus query, always starting with `/`.
    pub target: String,
}

impl FeedUrl {
    pub fn parse(url: &str) -> Result<Self, UpstreamFetchError> {
        let rest = url
            .strip_prefix("http://")
            .ok_or_else(|| UpstreamFetchError::UnsupportedUrl(url.to_string()))?;
        let (authority, target) = match rest.find(['/', '?']) {
            Some(i) if rest[i..].starts_with('/') => (&rest[..i], rest[i..].to_string()),
            Some(i) => (&rest[..i], format!("/{}", &rest[i..])),
            None => (rest, "/".to_string()),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse()
                    .map_err(|_| UpstreamFetchError::UnsupportedUrl(url.to_string()))?,
            ),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(UpstreamFetchError::UnsupportedUrl(url.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            target,
        })
    }
}

/// Split a raw HTTP response into status code and body.
pub fn split_response(raw: &[u8]) -> Result<(u16, &[u8]), UpstreamFetchError> {
    let head_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| UpstreamFetchError::Body("response has no header terminator".into()))?;
    let status_line = raw[..head_end]
        .split(|&b| b == b'\r')
        .next()
        .and_then(|l| core::str::from_utf8(l).ok())
        .unwrap_or_default();
    let status = status_line
        .split(' ')
        .nth(1)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| UpstreamFetchError::Body(format!("bad status line '{}'", status_line)))?;
    Ok((status, &raw[head_end + 4..]))
}

pub struct HttpWeatherFeed {
    url: FeedUrl,
    timeout: Duration,
}

impl HttpWeatherFeed {
    pub fn new(url: FeedUrl, timeout: Duration) -> Self {
        Self { url, timeout }
    }

    /// Build from the optional configured URL.
    pub fn from_config(url: Option<&str>, timeout: Duration) -> Result<Self, UpstreamFetchError> {
        let url = url.ok_or(UpstreamFetchError::NotConfigured)?;
        Ok(Self::new(FeedUrl::parse(url)?, timeout))
    }

    fn io(e: std::io::Error) -> UpstreamFetchError {
        UpstreamFetchError::Io(e.to_string())
    }
}

impl WeatherFeed for HttpWeatherFeed {
    fn fetch(&mut self) -> Result<Vec<u8>, UpstreamFetchError> {
        let addr = (self.url.host.as_str(), self.url.port)
            .to_socket_addrs()
            .map_err(Self::io)?
            .next()
            .ok_or_else(|| UpstreamFetchError::Io(format!("no address for {}", self.url.host)))?;

        let mut stream = TcpStream::connect_timeout(&addr, self.timeout).map_err(Self::io)?;
        stream.set_read_timeout(Some(self.timeout)).map_err(Self::io)?;
        stream.set_write_timeout(Some(self.timeout)).map_err(Self::io)?;

        let request = format!(
            "GET {} HTTP/1.0\r\nHost: {}\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
            self.url.target, self.url.host
        );
        stream.write_all(request.as_bytes()).map_err(Self::io)?;

        let mut raw = Vec::new();
        stream
            .take(MAX_RESPONSE_SIZE as u64 + 1)
            .read_to_end(&mut raw)
            .map_err(Self::io)?;
        if raw.len() > MAX_RESPONSE_SIZE {
            return Err(UpstreamFetchError::Body("response too large".into()));
        }

        let (status, body) = split_response(&raw)?;
        debug!("Weather feed answered {} ({} bytes)", status, body.len());
        if status != 200 {
            return Err(UpstreamFetchError::Status(status));
        }
        Ok(body.to_vec())
    }
}
