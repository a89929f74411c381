//! Form scoring against a profile's reference ranges.
//!
//! Worst-joint-wins: a single badly misaligned joint flags incorrect form
//! even when every other tracked angle is fine, so the aggregate is the
//! maximum absolute deviation across angles rather than any average.

use serde::{Deserialize, Serialize};

use formsense_core::ExerciseProfile;
use formsense_signal::ConditionedSignal;

/// Tri-state form classification.
///
/// `Unknown` means the signal was too unreliable to judge — it is a
/// distinct state, never conflated with `Incorrect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    /// Every tracked angle within tolerance of its reference range
    Correct,
    /// At least one tracked angle out of tolerance
    Incorrect,
    /// Signal invalid; no judgment possible
    Unknown,
}

impl FormStatus {
    /// Returns the status name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FormStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One frame's form judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormJudgment {
    /// Classification for this frame.
    pub status: FormStatus,
    /// Aggregate deviation clamped to [0, 100] (degrees, one point per
    /// degree outside the reference range).
    pub severity: f64,
    /// Label of the worst-deviating angle when form is incorrect.
    pub worst_label: Option<String>,
    /// Coaching cue for the worst-deviating angle when form is incorrect.
    pub cue: Option<String>,
    /// Frame-clock timestamp the judgment applies to.
    pub timestamp_ms: u64,
}

impl FormJudgment {
    /// An unknown judgment (signal invalid).
    #[must_use]
    pub fn unknown(timestamp_ms: u64) -> Self {
        Self {
            status: FormStatus::Unknown,
            severity: 0.0,
            worst_label: None,
            cue: None,
            timestamp_ms,
        }
    }
}

/// Stateless scorer comparing conditioned angles to reference ranges.
#[derive(Debug, Clone, Copy)]
pub struct FormScorer {
    tolerance_deg: f64,
}

impl FormScorer {
    /// Creates a scorer with the given tolerance in degrees.
    #[must_use]
    pub fn new(tolerance_deg: f64) -> Self {
        Self {
            tolerance_deg: tolerance_deg.max(0.0),
        }
    }

    /// Current tolerance in degrees.
    #[must_use]
    pub fn tolerance_deg(&self) -> f64 {
        self.tolerance_deg
    }

    /// Judges one conditioned frame against the profile.
    ///
    /// Any invalid required angle yields [`FormStatus::Unknown`].
    #[must_use]
    pub fn judge(&self, profile: &ExerciseProfile, signal: &ConditionedSignal) -> FormJudgment {
        if !signal.all_valid() {
            return FormJudgment::unknown(signal.timestamp_ms);
        }

        let mut worst: Option<(usize, f64)> = None;
        for (index, (spec, estimate)) in
            profile.angles.iter().zip(signal.angles.iter()).enumerate()
        {
            let deviation = spec.range.deviation(estimate.value_deg).abs();
            if worst.map_or(true, |(_, current)| deviation > current) {
                worst = Some((index, deviation));
            }
        }

        let (worst_index, aggregate) = worst.unwrap_or((0, 0.0));
        let correct = aggregate < self.tolerance_deg;
        let (worst_label, cue) = if correct {
            (None, None)
        } else {
            let spec = &profile.angles[worst_index];
            (Some(spec.label.clone()), Some(spec.cue.clone()))
        };

        FormJudgment {
            status: if correct {
                FormStatus::Correct
            } else {
                FormStatus::Incorrect
            },
            severity: aggregate.clamp(0.0, 100.0),
            worst_label,
            cue,
            timestamp_ms: signal.timestamp_ms,
        }
    }
}
