//! Core data types for the FormSense engine.
//!
//! This module defines the fundamental data structures used throughout the
//! pipeline for representing pose observations.
//!
//! # Type Categories
//!
//! - **Joint Types**: [`JointId`], [`JointPosition`]
//! - **Frame Types**: [`PoseFrame`]
//! - **Common Types**: [`Confidence`], [`SessionId`]

use std::collections::HashMap;

use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::DEFAULT_CONFIDENCE_THRESHOLD;

// =============================================================================
// Common Types
// =============================================================================

/// Unique identifier for an exercise session.
///
/// A fresh id is assigned whenever an exercise is selected; frames carrying
/// state for a torn-down session can be recognized and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new unique session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a session ID from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Confidence score in the range [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Confidence(f32);

impl Confidence {
    /// Maximum confidence.
    pub const MAX: Self = Self(1.0);

    /// Creates a new confidence value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range [0.0, 1.0].
    pub fn new(value: f32) -> CoreResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(CoreError::validation(format!(
                "Confidence must be in [0.0, 1.0], got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Creates a confidence value, clamping out-of-range input.
    #[must_use]
    pub fn clamped(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Returns the raw confidence value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Returns `true` if the confidence exceeds the default threshold.
    #[must_use]
    pub fn is_high(&self) -> bool {
        self.0 >= DEFAULT_CONFIDENCE_THRESHOLD
    }

    /// Returns `true` if the confidence exceeds the given threshold.
    #[must_use]
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.0 >= threshold
    }
}

// =============================================================================
// Joint Types
// =============================================================================

/// Identifiers for the body joints the engine tracks.
///
/// The set is closed: exercise profiles reference joints from this enum
/// only, so a profile is pure data and adding an exercise never requires a
/// new joint variant unless the movement genuinely involves a new joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointId {
    /// Left shoulder
    LeftShoulder,
    /// Right shoulder
    RightShoulder,
    /// Left elbow
    LeftElbow,
    /// Right elbow
    RightElbow,
    /// Left wrist
    LeftWrist,
    /// Right wrist
    RightWrist,
    /// Left hip
    LeftHip,
    /// Right hip
    RightHip,
    /// Left knee
    LeftKnee,
    /// Right knee
    RightKnee,
    /// Left ankle
    LeftAnkle,
    /// Right ankle
    RightAnkle,
}

impl JointId {
    /// Returns all joint identifiers in order.
    #[must_use]
    pub fn all() -> &'static [Self; 12] {
        &[
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftElbow,
            Self::RightElbow,
            Self::LeftWrist,
            Self::RightWrist,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
        ]
    }

    /// Returns the joint name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// Returns `true` if this is a lower body joint.
    #[must_use]
    pub fn is_lower_body(&self) -> bool {
        matches!(
            self,
            Self::LeftHip
                | Self::RightHip
                | Self::LeftKnee
                | Self::RightKnee
                | Self::LeftAnkle
                | Self::RightAnkle
        )
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single detected joint with position and confidence.
///
/// Coordinates are normalized image coordinates (x, y in [0, 1], y growing
/// downward) with an optional depth component, matching what pose-landmark
/// extractors emit. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointPosition {
    /// X coordinate (normalized)
    pub x: f64,
    /// Y coordinate (normalized)
    pub y: f64,
    /// Z coordinate (depth, if the extractor provides one)
    pub z: Option<f64>,
    /// Detection confidence
    pub confidence: Confidence,
}

impl JointPosition {
    /// Creates a new 2D joint position.
    #[must_use]
    pub fn new(x: f64, y: f64, confidence: Confidence) -> Self {
        Self {
            x,
            y,
            z: None,
            confidence,
        }
    }

    /// Creates a new 3D joint position.
    #[must_use]
    pub fn new_3d(x: f64, y: f64, z: f64, confidence: Confidence) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            confidence,
        }
    }

    /// Returns the 2D position as a tuple.
    #[must_use]
    pub fn position_2d(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Returns `true` if the detection clears the given confidence threshold.
    #[must_use]
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence.exceeds(threshold)
    }
}

// =============================================================================
// Frame Types
// =============================================================================

/// A timestamped set of detected joints for one camera frame.
///
/// Frames carry a strictly increasing sequence number assigned by the
/// producer; the engine rejects out-of-order or duplicate sequence numbers.
/// An absent joint key means "not detected this frame". Never mutated after
/// construction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseFrame {
    /// Monotonically increasing sequence number
    pub seq: u64,
    /// Capture timestamp on the frame clock, in milliseconds
    pub timestamp_ms: u64,
    /// Detected joints (absent key = not detected)
    joints: HashMap<JointId, JointPosition>,
}

impl PoseFrame {
    /// Creates an empty frame (no joints detected).
    #[must_use]
    pub fn new(seq: u64, timestamp_ms: u64) -> Self {
        Self {
            seq,
            timestamp_ms,
            joints: HashMap::new(),
        }
    }

    /// Adds a joint detection, replacing any previous entry for the same
    /// joint (keys are unique).
    #[must_use]
    pub fn with_joint(mut self, id: JointId, position: JointPosition) -> Self {
        self.joints.insert(id, position);
        self
    }

    /// Looks up a joint detection.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&JointPosition> {
        self.joints.get(&id)
    }

    /// Number of joints detected in this frame.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Returns `true` if every listed joint is present and clears the
    /// confidence threshold.
    #[must_use]
    pub fn has_confident(&self, ids: &[JointId], threshold: f32) -> bool {
        ids.iter().all(|id| {
            self.joints
                .get(id)
                .is_some_and(|j| j.is_confident(threshold))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rejects_out_of_range() {
        assert!(Confidence::new(1.5).is_err());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
    }

    #[test]
    fn confidence_clamped_saturates() {
        assert!((Confidence::clamped(7.0).value() - 1.0).abs() < f32::EPSILON);
        assert!((Confidence::clamped(-7.0).value() - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn confidence_threshold_checks() {
        let c = Confidence::new(0.6).unwrap();
        assert!(c.is_high());
        assert!(c.exceeds(0.5));
        assert!(!c.exceeds(0.7));
    }

    #[test]
    fn joint_names_are_stable() {
        assert_eq!(JointId::RightKnee.name(), "right_knee");
        assert_eq!(JointId::all().len(), 12);
    }

    #[test]
    fn lower_body_classification() {
        assert!(JointId::LeftAnkle.is_lower_body());
        assert!(!JointId::RightWrist.is_lower_body());
    }

    #[test]
    fn frame_joint_lookup() {
        let frame = PoseFrame::new(1, 33)
            .with_joint(
                JointId::RightKnee,
                JointPosition::new(0.5, 0.7, Confidence::MAX),
            )
            .with_joint(
                JointId::RightHip,
                JointPosition::new(0.5, 0.5, Confidence::new(0.4).unwrap()),
            );

        assert_eq!(frame.joint_count(), 2);
        assert!(frame.joint(JointId::RightKnee).is_some());
        assert!(frame.joint(JointId::LeftKnee).is_none());
    }

    #[test]
    fn has_confident_requires_every_joint() {
        let frame = PoseFrame::new(1, 33)
            .with_joint(
                JointId::RightKnee,
                JointPosition::new(0.5, 0.7, Confidence::MAX),
            )
            .with_joint(
                JointId::RightHip,
                JointPosition::new(0.5, 0.5, Confidence::new(0.4).unwrap()),
            );

        assert!(frame.has_confident(&[JointId::RightKnee], 0.5));
        assert!(!frame.has_confident(&[JointId::RightKnee, JointId::RightHip], 0.5));
        assert!(!frame.has_confident(&[JointId::RightAnkle], 0.5));
    }

    #[test]
    fn duplicate_joint_keys_are_replaced() {
        let frame = PoseFrame::new(1, 0)
            .with_joint(
                JointId::LeftHip,
                JointPosition::new(0.1, 0.1, Confidence::MAX),
            )
            .with_joint(
                JointId::LeftHip,
                JointPosition::new(0.2, 0.2, Confidence::MAX),
            );

        assert_eq!(frame.joint_count(), 1);
        let j = frame.joint(JointId::LeftHip).unwrap();
        assert!((j.x - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn pose_frame_serde_roundtrip() {
        let frame = PoseFrame::new(7, 231).with_joint(
            JointId::LeftKnee,
            JointPosition::new_3d(0.4, 0.8, 0.1, Confidence::new(0.9).unwrap()),
        );
        let json = serde_json::to_string(&frame).unwrap();
        let parsed: PoseFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.seq, 7);
        assert_eq!(parsed.joint_count(), 1);
    }
}
