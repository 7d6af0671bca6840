//! System clock adapter.
//!
//! Wall-clock timestamps come from `chrono::Utc::now()`; uptime is
//! measured with a monotonic `Instant` so it never jumps with NTP.

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::app::ports::Clock;

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_starts_near_zero() {
        let clock = SystemClock::new();
        assert!(clock.uptime_secs() < 5);
        assert!(clock.now() > DateTime::UNIX_EPOCH);
    }
}
