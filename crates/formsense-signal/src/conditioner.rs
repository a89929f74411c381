//! Pose-signal conditioning.
//!
//! Converts raw [`PoseFrame`]s into smoothed, validity-flagged angle
//! estimates for the angles a profile tracks. Per-frame measurements from
//! a pose extractor jitter by several degrees; an exponential moving
//! average per angle suppresses that without adding the group delay a
//! longer window filter would.
//!
//! A raw sample is *missing* when any joint of the triple is absent or
//! below the confidence threshold. Missing samples never update the
//! filter. After too many consecutive misses the estimate is declared
//! invalid; recovery reseeds the average from the fresh sample so a stale
//! value from before a long occlusion cannot leak through.

use formsense_core::{ExerciseProfile, JointId, PoseFrame};
use formsense_core::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_CONSECUTIVE_MISSES, DEFAULT_SMOOTHING_ALPHA,
};

use crate::geometry::angle_at;

/// Configuration for the signal conditioner.
#[derive(Debug, Clone, Copy)]
pub struct ConditionerConfig {
    /// Joints below this confidence are treated as undetected.
    pub confidence_threshold: f32,
    /// EMA smoothing factor in (0, 1); higher tracks faster.
    pub smoothing_alpha: f64,
    /// Consecutive misses after which an angle is declared invalid.
    pub max_consecutive_misses: u32,
}

impl Default for ConditionerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            max_consecutive_misses: DEFAULT_MAX_CONSECUTIVE_MISSES,
        }
    }
}

/// One conditioned angle estimate.
///
/// `value_deg` is the current filter output; it is only meaningful while
/// `valid` is set. During a short run of misses the estimate stays valid
/// and holds the last filtered value; once the miss run exceeds the
/// configured limit the estimate is invalid until a confident sample
/// arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleEstimate {
    /// Filtered angle in degrees.
    pub value_deg: f64,
    /// Whether the estimate may be acted upon.
    pub valid: bool,
}

impl AngleEstimate {
    /// The filtered value, or `None` while invalid.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.value_deg)
    }
}

/// Conditioned output for one frame: one estimate per tracked angle, in
/// profile order (index 0 is the primary angle).
#[derive(Debug, Clone)]
pub struct ConditionedSignal {
    /// Sequence number of the frame this signal was computed from.
    pub seq: u64,
    /// Frame-clock timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Estimates in profile angle order.
    pub angles: Vec<AngleEstimate>,
}

impl ConditionedSignal {
    /// The primary angle's estimate.
    #[must_use]
    pub fn primary(&self) -> AngleEstimate {
        self.angles[0]
    }

    /// `true` if every tracked angle currently has a valid estimate.
    #[must_use]
    pub fn all_valid(&self) -> bool {
        self.angles.iter().all(|a| a.valid)
    }
}

/// Per-angle filter state.
#[derive(Debug, Clone, Copy, Default)]
struct AngleFilter {
    ema: Option<f64>,
    miss_run: u32,
    invalid: bool,
}

/// EMA-based conditioner for the angles one exercise profile tracks.
///
/// Owns its filter state exclusively for the duration of a session;
/// switching exercises discards it via a fresh conditioner.
#[derive(Debug)]
pub struct SignalConditioner {
    triples: Vec<[JointId; 3]>,
    filters: Vec<AngleFilter>,
    config: ConditionerConfig,
}

impl SignalConditioner {
    /// Creates a conditioner for the given profile's tracked angles.
    ///
    /// The smoothing factor is clamped into (0, 1).
    #[must_use]
    pub fn for_profile(profile: &ExerciseProfile, config: ConditionerConfig) -> Self {
        let triples: Vec<[JointId; 3]> = profile.angles.iter().map(|a| a.joints).collect();
        let filters = vec![AngleFilter::default(); triples.len()];
        Self {
            triples,
            filters,
            config: ConditionerConfig {
                smoothing_alpha: config.smoothing_alpha.clamp(0.001, 0.999),
                ..config
            },
        }
    }

    /// Conditions one frame.
    ///
    /// Filter state advances only from non-missing samples; the returned
    /// signal always carries one estimate per tracked angle.
    pub fn process(&mut self, frame: &PoseFrame) -> ConditionedSignal {
        let alpha = self.config.smoothing_alpha;
        let mut angles = Vec::with_capacity(self.triples.len());

        for (triple, filter) in self.triples.iter().zip(self.filters.iter_mut()) {
            match raw_sample(frame, triple, self.config.confidence_threshold) {
                Some(sample) => {
                    filter.ema = Some(match filter.ema {
                        // Reseed after invalidity: the pre-occlusion
                        // average no longer describes the pose.
                        Some(prev) if !filter.invalid => alpha * sample + (1.0 - alpha) * prev,
                        _ => sample,
                    });
                    filter.miss_run = 0;
                    filter.invalid = false;
                }
                None => {
                    filter.miss_run = filter.miss_run.saturating_add(1);
                    if filter.miss_run > self.config.max_consecutive_misses {
                        filter.invalid = true;
                    }
                }
            }

            angles.push(AngleEstimate {
                value_deg: filter.ema.unwrap_or(0.0),
                valid: !filter.invalid && filter.ema.is_some(),
            });
        }

        ConditionedSignal {
            seq: frame.seq,
            timestamp_ms: frame.timestamp_ms,
            angles,
        }
    }

    /// Resets all filter state (used on exercise change).
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            *filter = AngleFilter::default();
        }
    }

    /// Current smoothing factor.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.config.smoothing_alpha
    }

    /// Number of tracked angles.
    #[must_use]
    pub fn angle_count(&self) -> usize {
        self.triples.len()
    }
}

/// Computes the raw angle for a triple, or `None` if any joint is absent
/// or under-confident this frame.
fn raw_sample(frame: &PoseFrame, triple: &[JointId; 3], threshold: f32) -> Option<f64> {
    let a = frame.joint(triple[0])?;
    let b = frame.joint(triple[1])?;
    let c = frame.joint(triple[2])?;
    if !(a.is_confident(threshold) && b.is_confident(threshold) && c.is_confident(threshold)) {
        return None;
    }
    Some(angle_at(a.position_2d(), b.position_2d(), c.position_2d()))
}
