//! Pump commands issued by the application core.
//!
//! The automation path only ever produces the two pump variants; the
//! manual API accepts any operator action string and forwards it verbatim.

use core::fmt;

/// A command destined for the actuator network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpCommand {
    TurnPumpOn,
    TurnPumpOff,
    /// Any other operator-supplied action, forwarded unchanged.
    Operator(String),
}

impl PumpCommand {
    /// Map an operator action to a command.  The two pump actions are
    /// recognised exactly; everything else is passed through.
    pub fn from_action(action: &str) -> Self {
        match action {
            "TURN_PUMP_ON" => Self::TurnPumpOn,
            "TURN_PUMP_OFF" => Self::TurnPumpOff,
            other => Self::Operator(other.to_string()),
        }
    }

    /// Wire name carried in the `command` field.
    pub fn as_str(&self) -> &str {
        match self {
            Self::TurnPumpOn => "TURN_PUMP_ON",
            Self::TurnPumpOff => "TURN_PUMP_OFF",
            Self::Operator(action) => action,
        }
    }
}

impl fmt::Display for PumpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who asked for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// The hysteresis controller.
    Automation,
    /// An operator through the API.
    Manual,
}
