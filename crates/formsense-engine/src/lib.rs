//! # FormSense Engine
//!
//! Real-time exercise-form analysis: repetition counting, depth tracking,
//! and form scoring over a stream of pose observations.
//!
//! ## Architecture
//!
//! ```text
//! PoseFrame ──> SignalConditioner ──┬──> RepTracker  ──┐
//!                                   └──> FormScorer  ──┤
//!                                                      ▼
//!                                             SessionController
//!                                                      │
//!                                     snapshots (broadcast) + events
//! ```
//!
//! The controller owns one active exercise session at a time, processes
//! frames strictly in sequence order, and degrades gracefully: noisy or
//! missing joints surface as `Unknown` form and a frozen phase, never as
//! a crash.
//!
//! ## Example
//!
//! ```rust
//! use formsense_core::{ExerciseId, PoseFrame, ProfileRegistry};
//! use formsense_engine::{EngineConfig, SessionController};
//!
//! # fn main() -> Result<(), formsense_engine::EngineError> {
//! let controller = SessionController::new(
//!     ProfileRegistry::builtin(),
//!     EngineConfig::default(),
//!     ExerciseId::Squat,
//! )?;
//!
//! let snapshot = controller.process_frame(PoseFrame::new(1, 33))?;
//! assert_eq!(snapshot.reps, 0);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod events;
pub mod feed;
pub mod form;
pub mod metrics;
pub mod rep;
pub mod session;
pub mod snapshot;

// Re-export main types
pub use events::{EventLog, SessionEvent};
pub use feed::{FeedHandle, FeedStats, FrameFeed};
pub use form::{FormJudgment, FormScorer, FormStatus};
pub use metrics::SessionMetrics;
pub use rep::{CompletedRep, RepPhase, RepTracker, RepUpdate};
pub use session::SessionController;
pub use snapshot::SessionSnapshot;

use formsense_core::{
    CoreError, ProfileError, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DWELL_MS,
    DEFAULT_FORM_TOLERANCE_DEG, DEFAULT_MAX_CONSECUTIVE_MISSES, DEFAULT_SMOOTHING_ALPHA,
};
use formsense_signal::ConditionerConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default capacity of the snapshot broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Default capacity of the session event log
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1024;

/// Common result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Unified error type for engine operations
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Exercise profile error (unknown id at selection time)
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Core validation or configuration error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Out-of-order, duplicate, or post-teardown frame
    #[error("Stale frame: sequence {seq} not after {last_seq}")]
    StaleFrame {
        /// Sequence number of the rejected frame
        seq: u64,
        /// Last accepted sequence number (0 if none)
        last_seq: u64,
    },
}

impl EngineError {
    /// Returns `true` if this error is recoverable.
    ///
    /// Stale frames and unknown-exercise selections are operational
    /// noise; the session keeps running.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::StaleFrame { .. } => true,
            Self::Profile(e) => e.is_recoverable(),
            Self::Core(e) => e.is_recoverable(),
        }
    }
}

/// Engine configuration.
///
/// Every tuning constant of the pipeline lives here rather than in code;
/// the defaults come from the core crate's constants.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Joints below this confidence are treated as undetected
    pub confidence_threshold: f32,
    /// EMA smoothing factor for angle signals, in (0, 1)
    pub smoothing_alpha: f64,
    /// Consecutive misses after which an angle signal is invalid
    pub max_consecutive_misses: u32,
    /// Minimum dwell at the bottom of a repetition (ms)
    pub dwell_ms: u64,
    /// Aggregate deviation below this is correct form (degrees)
    pub form_tolerance_deg: f64,
    /// Snapshot broadcast channel capacity
    pub broadcast_capacity: usize,
    /// Session event log capacity
    pub event_log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            max_consecutive_misses: DEFAULT_MAX_CONSECUTIVE_MISSES,
            dwell_ms: DEFAULT_DWELL_MS,
            form_tolerance_deg: DEFAULT_FORM_TOLERANCE_DEG,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// The conditioner's slice of this configuration.
    #[must_use]
    pub fn conditioner_config(&self) -> ConditionerConfig {
        ConditionerConfig {
            confidence_threshold: self.confidence_threshold,
            smoothing_alpha: self.smoothing_alpha,
            max_consecutive_misses: self.max_consecutive_misses,
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the joint confidence threshold.
    #[must_use]
    pub fn confidence_threshold(mut self, value: f32) -> Self {
        self.config.confidence_threshold = value.clamp(0.0, 1.0);
        self
    }

    /// Set the EMA smoothing factor.
    #[must_use]
    pub fn smoothing_alpha(mut self, value: f64) -> Self {
        self.config.smoothing_alpha = value.clamp(0.001, 0.999);
        self
    }

    /// Set the consecutive-miss limit.
    #[must_use]
    pub fn max_consecutive_misses(mut self, value: u32) -> Self {
        self.config.max_consecutive_misses = value;
        self
    }

    /// Set the bottom dwell time in milliseconds.
    #[must_use]
    pub fn dwell_ms(mut self, value: u64) -> Self {
        self.config.dwell_ms = value;
        self
    }

    /// Set the form tolerance in degrees.
    #[must_use]
    pub fn form_tolerance_deg(mut self, value: f64) -> Self {
        self.config.form_tolerance_deg = value.max(0.0);
        self
    }

    /// Set the snapshot broadcast capacity.
    #[must_use]
    pub fn broadcast_capacity(mut self, value: usize) -> Self {
        self.config.broadcast_capacity = value.max(1);
        self
    }

    /// Set the event log capacity.
    #[must_use]
    pub fn event_log_capacity(mut self, value: usize) -> Self {
        self.config.event_log_capacity = value.max(1);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = EngineConfig::default();
        assert!((config.smoothing_alpha - DEFAULT_SMOOTHING_ALPHA).abs() < f64::EPSILON);
        assert_eq!(config.dwell_ms, DEFAULT_DWELL_MS);
        assert_eq!(config.max_consecutive_misses, DEFAULT_MAX_CONSECUTIVE_MISSES);
    }

    #[test]
    fn test_builder_clamps_inputs() {
        let config = EngineConfig::builder()
            .confidence_threshold(3.0)
            .smoothing_alpha(-1.0)
            .broadcast_capacity(0)
            .build();
        assert!((config.confidence_threshold - 1.0).abs() < f32::EPSILON);
        assert!(config.smoothing_alpha > 0.0);
        assert_eq!(config.broadcast_capacity, 1);
    }

    #[test]
    fn test_stale_frame_is_recoverable() {
        let err = EngineError::StaleFrame { seq: 3, last_seq: 7 };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("sequence 3"));
    }
}
