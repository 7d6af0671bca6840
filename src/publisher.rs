//! Command publisher.
//!
//! Serialises a [`PumpCommand`] as `{"command": "<name>"}` and hands it to
//! the [`CommandTransport`] with a bounded timeout.  The outcome of the
//! most recent send is kept for diagnostics; cooldown bookkeeping is the
//! caller's job.

use core::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::app::commands::PumpCommand;
use crate::app::ports::CommandTransport;
use crate::error::TransportError;

#[derive(Serialize)]
struct CommandMessage<'a> {
    command: &'a str,
}

/// Encode the wire message for `command`.
pub fn encode_command(command: &PumpCommand) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(&CommandMessage {
        command: command.as_str(),
    })
    .map_err(|e| TransportError::Encode(e.to_string()))
}

/// Outcome of the most recent publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRecord {
    pub command: String,
    pub sent: bool,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

pub struct CommandPublisher<T> {
    transport: T,
    topic: String,
    timeout: Duration,
    last: Option<PublishRecord>,
}

impl<T: CommandTransport> CommandPublisher<T> {
    pub fn new(transport: T, topic: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            topic: topic.into(),
            timeout,
            last: None,
        }
    }

    /// Publish `command`.  `Ok(())` means the transport accepted it.
    pub fn send(&mut self, command: &PumpCommand, now: DateTime<Utc>) -> Result<(), TransportError> {
        let result = encode_command(command).and_then(|payload| {
            self.transport
                .publish(&self.topic, &payload, self.timeout)
        });

        match &result {
            Ok(()) => info!("Published {} to '{}'", command, self.topic),
            Err(e) => warn!("Publish of {} to '{}' failed: {}", command, self.topic, e),
        }

        self.last = Some(PublishRecord {
            command: command.as_str().to_string(),
            sent: result.is_ok(),
            error: result.as_ref().err().map(ToString::to_string),
            at: now,
        });
        result
    }

    pub fn last_outcome(&self) -> Option<&PublishRecord> {
        self.last.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recording {
        sent: Vec<(String, Vec<u8>)>,
        fail: bool,
    }

    impl CommandTransport for Recording {
        fn publish(
            &mut self,
            topic: &str,
            payload: &[u8],
            _timeout: Duration,
        ) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Disconnected);
            }
            self.sent.push((topic.to_string(), payload.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn encodes_command_object() {
        let bytes = encode_command(&PumpCommand::TurnPumpOn).unwrap();
        assert_eq!(bytes, br#"{"command":"TURN_PUMP_ON"}"#);
        let bytes = encode_command(&PumpCommand::Operator("say \"hi\"".into())).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["command"], "say \"hi\"");
    }

    #[test]
    fn records_success_and_failure() {
        let mut p = CommandPublisher::new(
            Recording {
                sent: Vec::new(),
                fail: false,
            },
            "actuator/command",
            Duration::from_secs(1),
        );
        assert!(p.last_outcome().is_none());

        p.send(&PumpCommand::TurnPumpOff, DateTime::UNIX_EPOCH).unwrap();
        assert_eq!(p.transport().sent.len(), 1);
        assert_eq!(p.transport().sent[0].0, "actuator/command");
        assert!(p.last_outcome().unwrap().sent);

        p.transport_mut().fail = true;
        assert_eq!(
            p.send(&PumpCommand::TurnPumpOn, DateTime::UNIX_EPOCH),
            Err(TransportError::Disconnected)
        );
        let last = p.last_outcome().unwrap();
        assert!(!last.sent);
        assert_eq!(last.command, "TURN_PUMP_ON");
        assert_eq!(last.error.as_deref(), Some("transport disconnected"));
    }
}
