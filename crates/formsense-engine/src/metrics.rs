//! Session processing counters.

use chrono::{DateTime, Utc};

/// Counters for one controller's processing stream.
///
/// Stale frames are a metric, never a hard error: an out-of-order camera
/// frame is expected operational noise.
#[derive(Debug, Clone)]
pub struct SessionMetrics {
    /// Frames accepted and processed
    pub frames_processed: u64,
    /// Frames rejected for stale/duplicate sequence numbers
    pub frames_stale: u64,
    /// Processed frames whose primary angle was invalid
    pub frames_invalid_signal: u64,
    /// Repetitions counted across all sessions of this controller
    pub reps_total: u64,
    /// Wall-clock time the controller was created
    pub started_at: DateTime<Utc>,
}

impl SessionMetrics {
    /// Fresh counters stamped with the current wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_processed: 0,
            frames_stale: 0,
            frames_invalid_signal: 0,
            reps_total: 0,
            started_at: Utc::now(),
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
