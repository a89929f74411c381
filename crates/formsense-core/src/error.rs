//! Error types for the FormSense engine.
//!
//! This module provides error handling using [`thiserror`] for automatic
//! `Display` and `Error` trait implementations.
//!
//! # Error Hierarchy
//!
//! - [`CoreError`]: Top-level error type for the core crate
//! - [`ProfileError`]: Errors from exercise profile lookup and validation
//!
//! Signal invalidity (too few confident joint detections) is deliberately
//! *not* an error: it flows through the data model as a first-class state
//! so the pipeline keeps running through noisy camera conditions.

use thiserror::Error;

use crate::profile::ExerciseId;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for the FormSense core.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Exercise profile error
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },

    /// Validation error for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// A recoverable error means the caller can continue with its current
    /// state (e.g. keep the previously selected exercise session running).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Profile(e) => e.is_recoverable(),
            Self::Configuration { .. } | Self::Validation { .. } => false,
        }
    }
}

/// Errors from exercise profile lookup and validation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProfileError {
    /// The exercise identifier is not present in the catalog
    #[error("Unknown exercise: {id}")]
    UnknownExercise {
        /// The identifier that failed the lookup
        id: ExerciseId,
    },

    /// A profile's angle thresholds are inconsistent
    #[error("Invalid profile for {id}: {message}")]
    InvalidProfile {
        /// The exercise the profile belongs to
        id: ExerciseId,
        /// Description of the inconsistency
        message: String,
    },
}

impl ProfileError {
    /// Returns `true` if this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            // Selection with a bad id keeps the previous session active.
            Self::UnknownExercise { .. } => true,
            Self::InvalidProfile { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_exercise_display_names_the_id() {
        let err = ProfileError::UnknownExercise {
            id: ExerciseId::Lunge,
        };
        assert!(err.to_string().contains("lunge"));
    }

    #[test]
    fn unknown_exercise_is_recoverable() {
        let err = CoreError::from(ProfileError::UnknownExercise {
            id: ExerciseId::Squat,
        });
        assert!(err.is_recoverable());
    }

    #[test]
    fn validation_error_is_not_recoverable() {
        let err = CoreError::validation("confidence out of range");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("Validation error"));
    }

    #[test]
    fn profile_error_converts_to_core_error() {
        let err: CoreError = ProfileError::InvalidProfile {
            id: ExerciseId::Squat,
            message: "entry below return".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Profile(_)));
    }
}
