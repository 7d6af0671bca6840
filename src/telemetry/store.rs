//! Telemetry store: the latest reading plus a fixed-capacity FIFO ring of
//! history, oldest first.
//!
//! The ring is a `heapless::Deque` sized at compile time for the largest
//! supported capacity; the configured capacity may be smaller.  Callers
//! only ever receive copies, so nothing outside the store can mutate the
//! live buffer.

use heapless::Deque;
use log::warn;

use super::Reading;

/// Maximum number of readings retained in history.
pub const HISTORY_CAPACITY: usize = 200;

pub struct TelemetryStore {
    latest: Option<Reading>,
    history: Deque<Reading, HISTORY_CAPACITY>,
    capacity: usize,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore {
    /// Store with the full [`HISTORY_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Store keeping at most `capacity` readings (1..=[`HISTORY_CAPACITY`]).
    pub fn with_capacity(capacity: usize) -> Self {
        debug_assert!((1..=HISTORY_CAPACITY).contains(&capacity));
        Self {
            latest: None,
            history: Deque::new(),
            capacity: capacity.clamp(1, HISTORY_CAPACITY),
        }
    }

    /// Make `reading` the latest and append it to history, evicting the
    /// oldest entries once the ring is at capacity.
    pub fn record(&mut self, reading: Reading) {
        while self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        if self.history.push_back(reading.clone()).is_err() {
            warn!("history ring rejected a reading at len {}", self.history.len());
        }
        self.latest = Some(reading);
    }

    /// Most recent reading; `None` until the first message arrives.
    pub fn latest(&self) -> Option<&Reading> {
        self.latest.as_ref()
    }

    /// Owned copy of the history, oldest first.
    pub fn history(&self) -> Vec<Reading> {
        self.history.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
