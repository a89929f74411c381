//! The externally visible session state.

use serde::{Deserialize, Serialize};

use formsense_core::{ExerciseId, SessionId};

use crate::form::FormStatus;
use crate::rep::RepPhase;

/// Aggregate session state, emitted once per processed frame and on
/// exercise selection. Read-only to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// The session this snapshot belongs to
    pub session_id: SessionId,
    /// The active exercise
    pub exercise: ExerciseId,
    /// Current repetition phase
    pub phase: RepPhase,
    /// Repetitions completed this session
    pub reps: u32,
    /// Depth percentage [0, 100]
    pub depth_pct: f64,
    /// Form classification
    pub form: FormStatus,
    /// Form severity [0, 100]
    pub severity: f64,
    /// Coaching cue for the worst-deviating angle, when form is incorrect
    pub cue: Option<String>,
    /// Sequence number of the last processed frame (`None` before the
    /// first frame of the session)
    pub last_seq: Option<u64>,
    /// Frame-clock timestamp of the last processed frame (ms)
    pub timestamp_ms: u64,
}

impl SessionSnapshot {
    /// The snapshot a fresh session starts with, before any frame.
    #[must_use]
    pub fn initial(session_id: SessionId, exercise: ExerciseId) -> Self {
        Self {
            session_id,
            exercise,
            phase: RepPhase::Idle,
            reps: 0,
            depth_pct: 0.0,
            form: FormStatus::Unknown,
            severity: 0.0,
            cue: None,
            last_seq: None,
            timestamp_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot_is_neutral() {
        let snapshot = SessionSnapshot::initial(SessionId::new(), ExerciseId::Squat);
        assert_eq!(snapshot.reps, 0);
        assert_eq!(snapshot.phase, RepPhase::Idle);
        assert_eq!(snapshot.form, FormStatus::Unknown);
        assert!(snapshot.last_seq.is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = SessionSnapshot::initial(SessionId::new(), ExerciseId::HighKnees);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("high_knees"));
        assert!(json.contains("idle"));
    }
}
