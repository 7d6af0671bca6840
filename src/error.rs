//! Unified error types for the gateway.
//!
//! Every subsystem has its own small enum; all of them convert into the
//! top-level [`Error`] so callers at the adapter edge can treat failures
//! uniformly.  None of these errors is fatal: the ingest and automation
//! paths log and carry on, the API layer turns them into structured
//! failure responses.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level gateway error
// ---------------------------------------------------------------------------

/// Every fallible operation in the gateway funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An inbound telemetry payload could not be turned into a reading.
    Malformed(MalformedMessage),
    /// A command could not be handed to the transport.
    Transport(TransportError),
    /// The external weather feed could not be fetched or decoded.
    Upstream(UpstreamFetchError),
    /// A client request or configuration value failed validation.
    Validation(ValidationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed message: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Upstream(e) => write!(f, "upstream fetch: {e}"),
            Self::Validation(e) => write!(f, "validation: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Ingestion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedMessage {
    /// Payload is not valid JSON.
    NotJson(String),
    /// Payload is JSON but not an object.
    NotAnObject,
    /// `soilMoisture` is absent.
    MissingMoisture,
    /// `soilMoisture` is present but not a finite number.
    InvalidMoisture,
    /// Payload exceeds the maximum accepted frame size.
    Oversize(usize),
}

impl fmt::Display for MalformedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson(e) => write!(f, "not JSON ({e})"),
            Self::NotAnObject => write!(f, "payload is not a JSON object"),
            Self::MissingMoisture => write!(f, "soilMoisture missing"),
            Self::InvalidMoisture => write!(f, "soilMoisture is not a number"),
            Self::Oversize(len) => write!(f, "payload too large ({len} bytes)"),
        }
    }
}

impl From<MalformedMessage> for Error {
    fn from(e: MalformedMessage) -> Self {
        Self::Malformed(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The command could not be serialised.
    Encode(String),
    /// The transport did not accept the message before the publish timeout.
    Timeout,
    /// The transport is closed or disconnected.
    Disconnected,
    /// Any other client-side failure.
    Client(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "encode failed: {e}"),
            Self::Timeout => write!(f, "publish timed out"),
            Self::Disconnected => write!(f, "transport disconnected"),
            Self::Client(e) => write!(f, "client error: {e}"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Weather feed errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFetchError {
    /// No feed URL configured.
    NotConfigured,
    /// Only plain `http://` feeds are supported.
    UnsupportedUrl(String),
    /// Connect / read / write failure.
    Io(String),
    /// Upstream answered with a non-success status.
    Status(u16),
    /// Response body could not be decoded.
    Body(String),
}

impl fmt::Display for UpstreamFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "weather feed not configured"),
            Self::UnsupportedUrl(url) => write!(f, "unsupported feed url '{url}'"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Status(code) => write!(f, "upstream returned HTTP {code}"),
            Self::Body(e) => write!(f, "bad response body: {e}"),
        }
    }
}

impl From<UpstreamFetchError> for Error {
    fn from(e: UpstreamFetchError) -> Self {
        Self::Upstream(e)
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required request field is missing or empty.
    MissingField(&'static str),
    /// The request body is not a JSON object.
    InvalidBody(String),
    /// A configuration value is out of range.
    Config(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field '{field}'"),
            Self::InvalidBody(e) => write!(f, "invalid request body: {e}"),
            Self::Config(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}
