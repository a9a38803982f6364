//! Event logging system for recent notable simulation events.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged event for display by a front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Tick within the episode when the event occurred
    pub tick: u64,
    /// Generation when the event occurred
    pub generation: u64,
    /// Wall-clock time of the event
    pub timestamp: DateTime<Utc>,
    /// Human-readable description of the event
    pub description: String,
    /// Category hint for display
    pub kind: EventKind,
}

/// Event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Episode ended and a new generation was bred
    Generation,
    /// A species died out
    Extinction,
    /// An extinct species was restarted from the archive
    Recovery,
    /// A disaster struck
    Disaster,
    /// A rock was turned into a shelter
    Shelter,
    /// Pause, reset and other user commands
    Control,
}

/// Bounded log of recent events, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: VecDeque<LoggedEvent>,
    max_events: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(50)
    }
}

impl EventLog {
    /// Creates a new event log with specified capacity
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Adds a new event to the log, dropping the oldest beyond capacity
    pub fn log(&mut self, tick: u64, generation: u64, kind: EventKind, description: String) {
        self.events.push_front(LoggedEvent {
            tick,
            generation,
            timestamp: Utc::now(),
            description,
            kind,
        });
        self.events.truncate(self.max_events);
    }

    /// Returns all events, newest first
    pub fn events(&self) -> &VecDeque<LoggedEvent> {
        &self.events
    }

    /// The `n` most recent events, newest first
    pub fn recent(&self, n: usize) -> Vec<LoggedEvent> {
        self.events.iter().take(n).cloned().collect()
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clears all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_bounded_and_newest_first() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.log(i, 0, EventKind::Control, format!("event {i}"));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.events()[0].description, "event 4");
        assert_eq!(log.recent(1)[0].tick, 4);
    }
}
