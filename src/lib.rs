//! SoilGate irrigation gateway library.
//!
//! Exposes the gateway logic for integration testing and for the
//! `soilgate` binary.  Broker-specific code (`adapters::mqtt`) is behind
//! the `gateway` feature; everything else builds and tests on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod app;
pub mod channels;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod publisher;
pub mod scheduler;
pub mod telemetry;
pub mod weather;
