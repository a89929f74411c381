//! FormSense Signal Conditioning Library
//!
//! This crate turns raw pose observations into the smoothed, validity-
//! flagged angle signals the rest of the FormSense engine consumes.
//!
//! # Features
//!
//! - **Geometry**: planar joint-triple angle measurement
//! - **Conditioning**: per-angle EMA smoothing, confidence gating,
//!   consecutive-miss tracking and invalidation
//!
//! # Example
//!
//! ```rust
//! use formsense_core::{ExerciseId, ProfileRegistry};
//! use formsense_signal::{ConditionerConfig, SignalConditioner};
//!
//! let registry = ProfileRegistry::builtin();
//! let profile = registry.lookup(ExerciseId::Squat).unwrap();
//!
//! let mut conditioner =
//!     SignalConditioner::for_profile(profile, ConditionerConfig::default());
//! # let frame = formsense_core::PoseFrame::new(1, 33);
//! let signal = conditioner.process(&frame);
//! assert_eq!(signal.angles.len(), profile.angles.len());
//! ```

#![forbid(unsafe_code)]

pub mod conditioner;
pub mod geometry;

// Re-export main types for convenience
pub use conditioner::{
    AngleEstimate, ConditionedSignal, ConditionerConfig, SignalConditioner,
};
pub use geometry::angle_at;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
