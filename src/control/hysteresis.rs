//! Hysteresis pump controller with a command cooldown.
//!
//! Two independent gates decide whether a reading produces a command:
//!
//! ```text
//!  reading ──▶ cooldown elapsed? ──no──▶ CoolingDown
//!                    │ yes
//!                    ▼
//!             moisture > dry && pump OFF ──▶ TURN_PUMP_ON
//!             moisture < wet && pump ON  ──▶ TURN_PUMP_OFF
//!             otherwise                  ──▶ Hold
//! ```
//!
//! On the automation path the cooldown timestamp advances only after the
//! publisher confirms the send.  A manual command advances it on dispatch
//! whatever the outcome.  The controller does not remember what it last
//! commanded: once the cooldown expires it re-issues the same command
//! while the triggering condition still holds.

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};

use crate::app::commands::PumpCommand;
use crate::app::ports::CommandTransport;
use crate::error::{TransportError, ValidationError};
use crate::publisher::CommandPublisher;
use crate::telemetry::{PumpStatus, Reading};

/// Dry/wet moisture thresholds.  `dry > wet` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    dry: i64,
    wet: i64,
}

impl Thresholds {
    pub fn new(dry: i64, wet: i64) -> Result<Self, ValidationError> {
        if dry <= wet {
            return Err(ValidationError::Config(
                "dry_threshold must be above wet_threshold",
            ));
        }
        Ok(Self { dry, wet })
    }

    pub fn dry(&self) -> i64 {
        self.dry
    }

    pub fn wet(&self) -> i64 {
        self.wet
    }
}

/// Pure decision: which command, if any, a reading implies.
pub fn decide(moisture: i64, reported: PumpStatus, thresholds: &Thresholds) -> Option<PumpCommand> {
    if moisture > thresholds.dry && reported == PumpStatus::Off {
        Some(PumpCommand::TurnPumpOn)
    } else if moisture < thresholds.wet && reported == PumpStatus::On {
        Some(PumpCommand::TurnPumpOff)
    } else {
        None
    }
}

/// Result of evaluating a reading, before any publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Last command was too recent.
    CoolingDown { remaining: TimeDelta },
    /// Dead band, or the pump is already where the moisture wants it.
    Hold,
    Issue(PumpCommand),
}

/// Result of one automation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationOutcome {
    CoolingDown { remaining: TimeDelta },
    Hold,
    Sent(PumpCommand),
    /// Publish failed; the cooldown was not consumed.
    Failed(PumpCommand, TransportError),
}

pub struct HysteresisController {
    thresholds: Thresholds,
    cooldown: TimeDelta,
    last_command_at: Option<DateTime<Utc>>,
}

impl HysteresisController {
    pub fn new(thresholds: Thresholds, cooldown_secs: u32) -> Self {
        Self {
            thresholds,
            cooldown: TimeDelta::seconds(i64::from(cooldown_secs)),
            last_command_at: None,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn cooldown(&self) -> TimeDelta {
        self.cooldown
    }

    /// When the last command was dispatched; `None` = never.
    pub fn last_command_at(&self) -> Option<DateTime<Utc>> {
        self.last_command_at
    }

    /// Time left before automation may act again.  `None` once elapsed.
    ///
    /// A clock that stepped backwards past the last command counts as
    /// still cooling down.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        let last = self.last_command_at?;
        let elapsed = now.signed_duration_since(last);
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    /// Evaluate a reading against the cooldown and thresholds.
    pub fn evaluate(&self, moisture: i64, reported: PumpStatus, now: DateTime<Utc>) -> Evaluation {
        if let Some(remaining) = self.cooldown_remaining(now) {
            return Evaluation::CoolingDown { remaining };
        }
        match decide(moisture, reported, &self.thresholds) {
            Some(command) => Evaluation::Issue(command),
            None => Evaluation::Hold,
        }
    }

    /// Run the automation path for one reading.
    pub fn step<T: CommandTransport>(
        &mut self,
        reading: &Reading,
        now: DateTime<Utc>,
        publisher: &mut CommandPublisher<T>,
    ) -> AutomationOutcome {
        match self.evaluate(reading.soil_moisture, reading.pump_status, now) {
            Evaluation::CoolingDown { remaining } => {
                debug!(
                    "Automation: cooldown active, {}s remaining",
                    remaining.num_seconds()
                );
                AutomationOutcome::CoolingDown { remaining }
            }
            Evaluation::Hold => AutomationOutcome::Hold,
            Evaluation::Issue(command) => {
                info!(
                    "Automation: moisture={} pump={} -> {}",
                    reading.soil_moisture,
                    reading.pump_status.as_str(),
                    command
                );
                match publisher.send(&command, now) {
                    Ok(()) => {
                        self.last_command_at = Some(now);
                        AutomationOutcome::Sent(command)
                    }
                    Err(e) => AutomationOutcome::Failed(command, e),
                }
            }
        }
    }

    /// Operator override: skip both gates, reset the cooldown on dispatch,
    /// then publish.
    pub fn manual<T: CommandTransport>(
        &mut self,
        command: &PumpCommand,
        now: DateTime<Utc>,
        publisher: &mut CommandPublisher<T>,
    ) -> Result<(), TransportError> {
        self.last_command_at = Some(now);
        publisher.send(command, now)
    }
}
