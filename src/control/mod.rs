//! Pump automation.

pub mod hysteresis;

pub use hysteresis::{AutomationOutcome, Evaluation, HysteresisController, Thresholds, decide};
