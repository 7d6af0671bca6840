//! Gateway API.
//!
//! A transport-agnostic dispatcher: an [`ApiRequest`] goes in, an
//! [`ApiResponse`] (status + JSON body) comes out.  The socket side lives
//! in `adapters::http_server`; [`http`] holds the wire codec.
//!
//! | Route                     | Method | Handler                    |
//! |---------------------------|--------|----------------------------|
//! | `/api/health`             | GET    | liveness                   |
//! | `/api/sensor/latest`      | GET    | latest reading + status    |
//! | `/api/sensor/history`     | GET    | history ring, oldest first |
//! | `/api/control/pump`       | POST   | manual override            |
//! | `/api/weather`            | GET    | cached weather snapshot    |
//! | `/api/diagnostics`        | GET    | counters + last publish    |

pub mod http;

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::{Value, json};

use crate::app::commands::PumpCommand;
use crate::app::ports::{CommandTransport, EventSink};
use crate::app::service::GatewayService;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Other,
}

impl Method {
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    /// Request target; any query string is ignored by routing.
    pub path: String,
    pub body: Vec<u8>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: Vec::new(),
        }
    }

    pub fn post(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: impl core::fmt::Display) -> Self {
        Self {
            status,
            body: json!({ "success": false, "error": message.to_string() }),
        }
    }
}

enum Route {
    Health,
    Latest,
    History,
    Pump,
    Weather,
    Diagnostics,
}

impl Route {
    fn resolve(path: &str) -> Option<Self> {
        let path = path.split('?').next().unwrap_or_default();
        let path = path.strip_suffix('/').filter(|p| !p.is_empty()).unwrap_or(path);
        match path {
            "/api/health" => Some(Self::Health),
            "/api/sensor/latest" => Some(Self::Latest),
            "/api/sensor/history" => Some(Self::History),
            "/api/control/pump" => Some(Self::Pump),
            "/api/weather" => Some(Self::Weather),
            "/api/diagnostics" => Some(Self::Diagnostics),
            _ => None,
        }
    }

    fn method(&self) -> Method {
        match self {
            Self::Pump => Method::Post,
            _ => Method::Get,
        }
    }
}

/// Extract the `action` string from a manual-command body.
pub fn parse_manual_action(body: &[u8]) -> Result<String, ValidationError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::InvalidBody(e.to_string()))?;
    match value.get("action") {
        Some(Value::String(action)) if !action.trim().is_empty() => Ok(action.clone()),
        _ => Err(ValidationError::MissingField("action")),
    }
}

/// Route and handle one request.  Never panics on client input.
pub fn dispatch<T: CommandTransport>(
    service: &GatewayService<T>,
    req: &ApiRequest,
    now: DateTime<Utc>,
    uptime_secs: u64,
    sink: &mut impl EventSink,
) -> ApiResponse {
    let Some(route) = Route::resolve(&req.path) else {
        return ApiResponse::error(404, "not found");
    };
    if req.method != route.method() {
        return ApiResponse::error(405, "method not allowed");
    }

    match route {
        Route::Health => ApiResponse::ok(json!({ "status": "ok" })),
        Route::Latest => to_response(&service.latest_status(now)),
        Route::History => to_response(&service.history()),
        Route::Weather => to_response(&service.weather()),
        Route::Diagnostics => to_response(&service.diagnostics(uptime_secs)),
        Route::Pump => {
            let action = match parse_manual_action(&req.body) {
                Ok(a) => a,
                Err(e) => return ApiResponse::error(400, e),
            };
            let command = PumpCommand::from_action(&action);
            match service.manual_command(command.clone(), now, sink) {
                Ok(()) => ApiResponse::ok(json!({ "success": true, "command": command.as_str() })),
                Err(e) => {
                    warn!("Manual command {} not delivered: {}", command, e);
                    ApiResponse {
                        status: 502,
                        body: json!({
                            "success": false,
                            "command": command.as_str(),
                            "error": e.to_string(),
                        }),
                    }
                }
            }
        }
    }
}

fn to_response(value: &impl serde::Serialize) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(body) => ApiResponse::ok(body),
        Err(e) => ApiResponse::error(500, e),
    }
}
