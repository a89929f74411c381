//! Session domain events.
//!
//! The engine emits a small, append-only stream of events alongside the
//! per-frame snapshots: repetitions completed, visible depth changes, form
//! status changes, and signal loss/recovery. Timestamps are frame-clock
//! milliseconds so replaying the same frame sequence yields the same
//! event stream.

use serde::{Deserialize, Serialize};

use formsense_core::{ExerciseId, SessionId};

use crate::form::FormStatus;

/// All session events in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A new exercise session started.
    ExerciseSelected {
        /// Session the event belongs to
        session_id: SessionId,
        /// The selected exercise
        exercise: ExerciseId,
        /// Frame-clock timestamp (ms)
        timestamp_ms: u64,
    },

    /// A full repetition cycle completed.
    RepCompleted {
        /// The active exercise
        exercise: ExerciseId,
        /// Total repetitions after this one
        count: u32,
        /// Duration of the cycle (ms)
        cycle_ms: u64,
        /// Frame-clock timestamp (ms)
        timestamp_ms: u64,
    },

    /// The displayed depth changed by at least one whole percent.
    DepthUpdated {
        /// New depth percentage [0, 100]
        depth_pct: f64,
        /// Frame-clock timestamp (ms)
        timestamp_ms: u64,
    },

    /// The form classification changed.
    FormStatusChanged {
        /// Previous classification
        previous: FormStatus,
        /// New classification
        current: FormStatus,
        /// Frame-clock timestamp (ms)
        timestamp_ms: u64,
    },

    /// The primary angle's signal became invalid (occlusion, low light).
    SignalLost {
        /// Frame-clock timestamp (ms)
        timestamp_ms: u64,
    },

    /// A confident sample arrived after a signal loss.
    SignalRestored {
        /// Frame-clock timestamp (ms)
        timestamp_ms: u64,
    },
}

impl SessionEvent {
    /// Frame-clock timestamp of the event.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            Self::ExerciseSelected { timestamp_ms, .. }
            | Self::RepCompleted { timestamp_ms, .. }
            | Self::DepthUpdated { timestamp_ms, .. }
            | Self::FormStatusChanged { timestamp_ms, .. }
            | Self::SignalLost { timestamp_ms }
            | Self::SignalRestored { timestamp_ms } => *timestamp_ms,
        }
    }

    /// Event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ExerciseSelected { .. } => "ExerciseSelected",
            Self::RepCompleted { .. } => "RepCompleted",
            Self::DepthUpdated { .. } => "DepthUpdated",
            Self::FormStatusChanged { .. } => "FormStatusChanged",
            Self::SignalLost { .. } => "SignalLost",
            Self::SignalRestored { .. } => "SignalRestored",
        }
    }
}

/// Append-only in-memory event log with ring-buffer eviction.
///
/// When the capacity is exceeded the oldest events are evicted; the log
/// bounds memory for arbitrarily long sessions.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<SessionEvent>,
    max_events: usize,
}

impl EventLog {
    /// Creates a log with the given maximum capacity.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::with_capacity(max_events.min(4096)),
            max_events: max_events.max(1),
        }
    }

    /// Appends an event, evicting the oldest at capacity.
    pub fn append(&mut self, event: SessionEvent) {
        if self.events.len() >= self.max_events {
            self.events.remove(0);
        }
        self.events.push(event);
    }

    /// All retained events, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<SessionEvent> {
        self.events.clone()
    }

    /// Events at or after the given frame-clock time.
    #[must_use]
    pub fn since_ms(&self, timestamp_ms: u64) -> Vec<SessionEvent> {
        self.events
            .iter()
            .filter(|e| e.timestamp_ms() >= timestamp_ms)
            .cloned()
            .collect()
    }

    /// The most recent event, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&SessionEvent> {
        self.events.last()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_events
    }

    /// Removes all events (exercise change).
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep_event(count: u32, ts: u64) -> SessionEvent {
        SessionEvent::RepCompleted {
            exercise: ExerciseId::Squat,
            count,
            cycle_ms: 900,
            timestamp_ms: ts,
        }
    }

    #[test]
    fn test_append_and_latest() {
        let mut log = EventLog::new(10);
        assert!(log.is_empty());

        log.append(rep_event(1, 500));
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().event_type(), "RepCompleted");
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.append(rep_event(i + 1, u64::from(i) * 100));
        }
        assert_eq!(log.len(), 3);
        // Oldest two evicted.
        let all = log.all();
        assert_eq!(all[0].timestamp_ms(), 200);
    }

    #[test]
    fn test_since_ms_filters() {
        let mut log = EventLog::new(10);
        for i in 0..5 {
            log.append(rep_event(i + 1, u64::from(i) * 100));
        }
        let recent = log.since_ms(250);
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_event_type_names() {
        let event = SessionEvent::SignalLost { timestamp_ms: 33 };
        assert_eq!(event.event_type(), "SignalLost");
        assert_eq!(event.timestamp_ms(), 33);
    }

    #[test]
    fn test_serde_roundtrip() {
        let event = SessionEvent::FormStatusChanged {
            previous: FormStatus::Correct,
            current: FormStatus::Unknown,
            timestamp_ms: 66,
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
