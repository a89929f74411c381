//! # FormSense Core
//!
//! Core types, errors, and the exercise profile catalog for the FormSense
//! real-time exercise-form analysis engine.
//!
//! This crate provides the foundational building blocks used throughout the
//! FormSense pipeline, including:
//!
//! - **Core Data Types**: [`PoseFrame`], [`JointPosition`], [`JointId`],
//!   and [`Confidence`] for representing per-frame pose observations.
//!
//! - **Exercise Profiles**: [`ExerciseProfile`], [`AngleSpec`], and the
//!   [`ProfileRegistry`] catalog. Profiles are tagged data — one shape
//!   reused across all exercises, differing only by joint triples and
//!   thresholds.
//!
//! - **Error Types**: [`CoreError`] and [`ProfileError`] via the [`error`]
//!   module.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization via serde
//!
//! ## Example
//!
//! ```rust
//! use formsense_core::{Confidence, JointId, JointPosition, PoseFrame};
//!
//! let frame = PoseFrame::new(1, 33).with_joint(
//!     JointId::RightKnee,
//!     JointPosition::new(0.5, 0.75, Confidence::new(0.95).unwrap()),
//! );
//!
//! assert!(frame.joint(JointId::RightKnee).is_some());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod profile;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{CoreError, CoreResult, ProfileError};
pub use profile::{AngleRange, AngleSpec, ExerciseId, ExerciseProfile, ProfileRegistry};
pub use types::{Confidence, JointId, JointPosition, PoseFrame, SessionId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default confidence threshold below which a joint detection is treated
/// as missing
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Default exponential-moving-average smoothing factor for angle signals
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.3;

/// Default number of consecutive missing samples after which an angle
/// signal is declared invalid
pub const DEFAULT_MAX_CONSECUTIVE_MISSES: u32 = 5;

/// Default minimum dwell time at the bottom of a repetition, milliseconds
pub const DEFAULT_DWELL_MS: u64 = 150;

/// Default form tolerance in degrees (aggregate deviation below this is
/// considered correct form)
pub const DEFAULT_FORM_TOLERANCE_DEG: f64 = 10.0;

/// Prelude module for convenient imports.
///
/// ```rust
/// use formsense_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult, ProfileError};
    pub use crate::profile::{
        AngleRange, AngleSpec, ExerciseId, ExerciseProfile, ProfileRegistry,
    };
    pub use crate::types::{Confidence, JointId, JointPosition, PoseFrame, SessionId};
}
