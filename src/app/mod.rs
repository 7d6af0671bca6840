//! Application core — gateway logic behind port traits.
//!
//! This module ties the telemetry store, hysteresis controller, command
//! publisher and weather cache together into [`service::GatewayService`].
//! All interaction with brokers, sockets and clocks happens through the
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! with mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
