//! Exercise profiles and the profile registry.
//!
//! A profile is pure data: the joint-triple angles to track, a reference
//! range per angle for correct form, the depth anchors, and the phase
//! thresholds driving the repetition state machine. Adding an exercise is a
//! data-table change — no code elsewhere dispatches on the exercise kind.
//!
//! All angle values are degrees. `top_deg` is the primary angle's value at
//! the rest position and `bottom_deg` its value at full depth; for a squat
//! the angle falls toward the bottom (172° → 90°), for jumping jacks it
//! rises (40° → 150°). The [`ExerciseProfile::excursion`] normalization
//! makes both directions look identical downstream.

use std::collections::HashMap;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ProfileError};
use crate::types::JointId;

/// Identifiers for the exercises in the built-in catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExerciseId {
    /// Bodyweight squat
    Squat,
    /// Forward lunge
    Lunge,
    /// Jumping jacks
    JumpingJacks,
    /// High knees
    HighKnees,
    /// Standing side leg raise
    SideLegRaise,
}

impl ExerciseId {
    /// Returns all catalog identifiers in order.
    #[must_use]
    pub fn all() -> &'static [Self; 5] {
        &[
            Self::Squat,
            Self::Lunge,
            Self::JumpingJacks,
            Self::HighKnees,
            Self::SideLegRaise,
        ]
    }

    /// Returns the identifier as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Squat => "squat",
            Self::Lunge => "lunge",
            Self::JumpingJacks => "jumping_jacks",
            Self::HighKnees => "high_knees",
            Self::SideLegRaise => "side_leg_raise",
        }
    }
}

impl std::fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExerciseId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squat" => Ok(Self::Squat),
            "lunge" => Ok(Self::Lunge),
            "jumping_jacks" => Ok(Self::JumpingJacks),
            "high_knees" => Ok(Self::HighKnees),
            "side_leg_raise" => Ok(Self::SideLegRaise),
            _ => Err(CoreError::validation(format!(
                "unrecognized exercise name: {s}"
            ))),
        }
    }
}

/// Inclusive reference range for a tracked angle, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AngleRange {
    /// Lower bound (degrees)
    pub min_deg: f64,
    /// Upper bound (degrees)
    pub max_deg: f64,
}

impl AngleRange {
    /// Creates a new range.
    #[must_use]
    pub fn new(min_deg: f64, max_deg: f64) -> Self {
        Self { min_deg, max_deg }
    }

    /// Returns `true` if the angle lies inside the range.
    #[must_use]
    pub fn contains(&self, angle_deg: f64) -> bool {
        (self.min_deg..=self.max_deg).contains(&angle_deg)
    }

    /// Signed deviation from the nearest bound: negative below `min_deg`,
    /// positive above `max_deg`, zero inside the range.
    #[must_use]
    pub fn deviation(&self, angle_deg: f64) -> f64 {
        if angle_deg < self.min_deg {
            angle_deg - self.min_deg
        } else if angle_deg > self.max_deg {
            angle_deg - self.max_deg
        } else {
            0.0
        }
    }
}

/// One tracked angle: a joint triple with the vertex in the middle, its
/// reference range, and the coaching cue shown when it is the worst
/// offender.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AngleSpec {
    /// Stable label, e.g. `"right_knee"`
    pub label: String,
    /// Joint triple; the angle is measured at the middle joint
    pub joints: [JointId; 3],
    /// Reference range for correct form across the whole movement
    pub range: AngleRange,
    /// Coaching cue for this angle
    pub cue: String,
}

impl AngleSpec {
    /// Creates a new angle spec.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        joints: [JointId; 3],
        range: AngleRange,
        cue: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            joints,
            range,
            cue: cue.into(),
        }
    }

    /// The vertex joint the angle is measured at.
    #[must_use]
    pub fn vertex(&self) -> JointId {
        self.joints[1]
    }
}

/// Static definition of one exercise.
///
/// Immutable after registration; the engine clones the profile into the
/// active session, so a registry lookup never outlives a frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExerciseProfile {
    /// Exercise identifier
    pub id: ExerciseId,
    /// Human-readable name
    pub name: String,
    /// Tracked angles; index 0 is the primary angle driving phases
    pub angles: Vec<AngleSpec>,
    /// Primary angle at the rest position (degrees)
    pub top_deg: f64,
    /// Primary angle at full depth (degrees)
    pub bottom_deg: f64,
    /// Phase entry threshold: crossing it toward the bottom starts a rep
    pub entry_deg: f64,
    /// Phase return threshold: crossing it back completes a rep
    pub return_deg: f64,
    /// Width of the bottom tolerance band the dwell timer runs in
    pub bottom_tolerance_deg: f64,
}

impl ExerciseProfile {
    /// The primary tracked angle (drives phase transitions and depth).
    #[must_use]
    pub fn primary(&self) -> &AngleSpec {
        &self.angles[0]
    }

    /// Every joint any tracked angle needs, deduplicated.
    #[must_use]
    pub fn required_joints(&self) -> Vec<JointId> {
        let mut joints = Vec::new();
        for spec in &self.angles {
            for j in spec.joints {
                if !joints.contains(&j) {
                    joints.push(j);
                }
            }
        }
        joints
    }

    /// Normalized excursion of a primary-angle value: 0 at `top_deg`,
    /// 1 at `bottom_deg`, unclamped. Works for falling and rising
    /// movements alike since the denominator carries the sign.
    #[must_use]
    pub fn excursion(&self, angle_deg: f64) -> f64 {
        (self.top_deg - angle_deg) / (self.top_deg - self.bottom_deg)
    }

    /// Depth percentage in [0, 100] for a primary-angle value.
    #[must_use]
    pub fn depth_pct(&self, angle_deg: f64) -> f64 {
        self.excursion(angle_deg).clamp(0.0, 1.0) * 100.0
    }

    /// Entry threshold in excursion space.
    #[must_use]
    pub fn entry_excursion(&self) -> f64 {
        self.excursion(self.entry_deg)
    }

    /// Return threshold in excursion space.
    #[must_use]
    pub fn return_excursion(&self) -> f64 {
        self.excursion(self.return_deg)
    }

    /// Lower edge of the bottom tolerance band in excursion space.
    #[must_use]
    pub fn band_excursion(&self) -> f64 {
        1.0 - self.bottom_tolerance_deg / (self.top_deg - self.bottom_deg).abs()
    }

    /// Checks the profile's internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidProfile`] naming the first
    /// inconsistency found.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let fail = |message: &str| {
            Err(ProfileError::InvalidProfile {
                id: self.id,
                message: message.to_string(),
            })
        };

        if self.angles.is_empty() {
            return fail("profile tracks no angles");
        }
        if (self.top_deg - self.bottom_deg).abs() < f64::EPSILON {
            return fail("top and bottom angles coincide");
        }
        if self.bottom_tolerance_deg <= 0.0 {
            return fail("bottom tolerance must be positive");
        }

        let entry = self.entry_excursion();
        let ret = self.return_excursion();
        let band = self.band_excursion();
        if !(0.0..=1.0).contains(&entry) {
            return fail("entry threshold outside the top..bottom sweep");
        }
        if ret >= entry {
            return fail("return threshold must sit above the entry threshold");
        }
        if band <= entry {
            return fail("bottom band must sit below the entry threshold");
        }
        Ok(())
    }
}

/// Catalog of exercise profiles, looked up by identifier.
///
/// Initialized once at startup; no runtime mutation beyond explicit
/// [`ProfileRegistry::register`] calls made before the engine starts.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<ExerciseId, ExerciseProfile>,
}

impl ProfileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from explicit profiles, validating each one.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn with_profiles(profiles: Vec<ExerciseProfile>) -> CoreResult<Self> {
        let mut registry = Self::new();
        for profile in profiles {
            registry.register(profile)?;
        }
        Ok(registry)
    }

    /// The built-in catalog.
    #[must_use]
    pub fn builtin() -> Self {
        let profiles = vec![
            squat_profile(),
            lunge_profile(),
            jumping_jacks_profile(),
            high_knees_profile(),
            side_leg_raise_profile(),
        ];
        // The built-in table is validated by unit tests; registration
        // cannot fail here.
        let mut registry = Self::new();
        for profile in profiles {
            registry.profiles.insert(profile.id, profile);
        }
        registry
    }

    /// Adds or replaces a profile after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidProfile`] if the profile is
    /// inconsistent.
    pub fn register(&mut self, profile: ExerciseProfile) -> CoreResult<()> {
        profile.validate()?;
        self.profiles.insert(profile.id, profile);
        Ok(())
    }

    /// Looks up a profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::UnknownExercise`] if the identifier is not
    /// in this catalog.
    pub fn lookup(&self, id: ExerciseId) -> Result<&ExerciseProfile, ProfileError> {
        self.profiles
            .get(&id)
            .ok_or(ProfileError::UnknownExercise { id })
    }

    /// Identifiers present in this catalog.
    #[must_use]
    pub fn ids(&self) -> Vec<ExerciseId> {
        self.profiles.keys().copied().collect()
    }

    /// Number of registered profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// =============================================================================
// Built-in catalog data
// =============================================================================

fn squat_profile() -> ExerciseProfile {
    ExerciseProfile {
        id: ExerciseId::Squat,
        name: "Squat".into(),
        angles: vec![
            AngleSpec::new(
                "right_knee",
                [JointId::RightHip, JointId::RightKnee, JointId::RightAnkle],
                AngleRange::new(70.0, 178.0),
                "SIT BACK INTO THE HEELS!",
            ),
            AngleSpec::new(
                "left_knee",
                [JointId::LeftHip, JointId::LeftKnee, JointId::LeftAnkle],
                AngleRange::new(70.0, 178.0),
                "KNEES OUT!",
            ),
            AngleSpec::new(
                "right_hip",
                [JointId::RightShoulder, JointId::RightHip, JointId::RightKnee],
                AngleRange::new(80.0, 178.0),
                "TOO MUCH LEAN!",
            ),
        ],
        top_deg: 172.0,
        bottom_deg: 90.0,
        entry_deg: 135.0,
        return_deg: 160.0,
        bottom_tolerance_deg: 25.0,
    }
}

fn lunge_profile() -> ExerciseProfile {
    ExerciseProfile {
        id: ExerciseId::Lunge,
        name: "Lunge".into(),
        angles: vec![
            AngleSpec::new(
                "front_knee",
                [JointId::RightHip, JointId::RightKnee, JointId::RightAnkle],
                AngleRange::new(70.0, 178.0),
                "DROP THE BACK KNEE!",
            ),
            AngleSpec::new(
                "torso",
                [JointId::RightShoulder, JointId::RightHip, JointId::RightKnee],
                AngleRange::new(85.0, 180.0),
                "TORSO UPRIGHT!",
            ),
        ],
        top_deg: 172.0,
        bottom_deg: 90.0,
        entry_deg: 130.0,
        return_deg: 165.0,
        bottom_tolerance_deg: 25.0,
    }
}

fn jumping_jacks_profile() -> ExerciseProfile {
    ExerciseProfile {
        id: ExerciseId::JumpingJacks,
        name: "Jumping Jacks".into(),
        angles: vec![
            AngleSpec::new(
                "right_arm",
                [JointId::RightHip, JointId::RightShoulder, JointId::RightElbow],
                AngleRange::new(10.0, 180.0),
                "FULL RANGE OVERHEAD!",
            ),
            AngleSpec::new(
                "left_arm",
                [JointId::LeftHip, JointId::LeftShoulder, JointId::LeftElbow],
                AngleRange::new(10.0, 180.0),
                "FULL RANGE OVERHEAD!",
            ),
            AngleSpec::new(
                "right_elbow",
                [JointId::RightShoulder, JointId::RightElbow, JointId::RightWrist],
                AngleRange::new(140.0, 180.0),
                "STRAIGHTEN ARMS!",
            ),
        ],
        // The arm angle rises toward the extreme: 40 degrees at rest,
        // 150 with arms overhead.
        top_deg: 40.0,
        bottom_deg: 150.0,
        entry_deg: 95.0,
        return_deg: 50.0,
        bottom_tolerance_deg: 20.0,
    }
}

fn high_knees_profile() -> ExerciseProfile {
    ExerciseProfile {
        id: ExerciseId::HighKnees,
        name: "High Knees".into(),
        angles: vec![
            AngleSpec::new(
                "right_hip",
                [JointId::RightShoulder, JointId::RightHip, JointId::RightKnee],
                AngleRange::new(95.0, 180.0),
                "STAND TALL!",
            ),
            AngleSpec::new(
                "left_hip",
                [JointId::LeftShoulder, JointId::LeftHip, JointId::LeftKnee],
                AngleRange::new(95.0, 180.0),
                "KNEES HIGHER!",
            ),
        ],
        top_deg: 175.0,
        bottom_deg: 110.0,
        entry_deg: 140.0,
        return_deg: 150.0,
        bottom_tolerance_deg: 5.0,
    }
}

fn side_leg_raise_profile() -> ExerciseProfile {
    ExerciseProfile {
        id: ExerciseId::SideLegRaise,
        name: "Side Leg Raise".into(),
        angles: vec![
            AngleSpec::new(
                "right_hip",
                [JointId::RightShoulder, JointId::RightHip, JointId::RightKnee],
                AngleRange::new(135.0, 180.0),
                "LIFT HIGHER!",
            ),
            AngleSpec::new(
                "right_knee",
                [JointId::RightHip, JointId::RightKnee, JointId::RightAnkle],
                AngleRange::new(160.0, 180.0),
                "KEEP THE LEG STRAIGHT!",
            ),
        ],
        top_deg: 178.0,
        bottom_deg: 140.0,
        entry_deg: 165.0,
        return_deg: 170.0,
        bottom_tolerance_deg: 15.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_complete_and_valid() {
        let registry = ProfileRegistry::builtin();
        assert_eq!(registry.len(), ExerciseId::all().len());
        for &id in ExerciseId::all() {
            let profile = registry.lookup(id).unwrap();
            profile.validate().unwrap();
            assert_eq!(profile.id, id);
        }
    }

    #[test]
    fn lookup_missing_id_fails_with_unknown_exercise() {
        let registry =
            ProfileRegistry::with_profiles(vec![super::squat_profile()]).unwrap();
        let err = registry.lookup(ExerciseId::Lunge).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::UnknownExercise {
                id: ExerciseId::Lunge
            }
        ));
    }

    #[test]
    fn excursion_normalizes_both_directions() {
        let registry = ProfileRegistry::builtin();

        // Falling movement: squat knee angle.
        let squat = registry.lookup(ExerciseId::Squat).unwrap();
        assert!((squat.excursion(172.0)).abs() < 1e-9);
        assert!((squat.excursion(90.0) - 1.0).abs() < 1e-9);
        assert!(squat.excursion(135.0) > 0.0 && squat.excursion(135.0) < 1.0);

        // Rising movement: jumping-jack arm angle.
        let jacks = registry.lookup(ExerciseId::JumpingJacks).unwrap();
        assert!((jacks.excursion(40.0)).abs() < 1e-9);
        assert!((jacks.excursion(150.0) - 1.0).abs() < 1e-9);
        assert!(jacks.excursion(130.0) > jacks.excursion(95.0));
    }

    #[test]
    fn depth_is_clamped_for_out_of_range_angles() {
        let registry = ProfileRegistry::builtin();
        let squat = registry.lookup(ExerciseId::Squat).unwrap();
        assert!((squat.depth_pct(60.0) - 100.0).abs() < f64::EPSILON);
        assert!((squat.depth_pct(179.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_ordering_holds_for_every_builtin() {
        let registry = ProfileRegistry::builtin();
        for &id in ExerciseId::all() {
            let p = registry.lookup(id).unwrap();
            assert!(
                p.return_excursion() < p.entry_excursion(),
                "{id}: return must be nearer the top than entry"
            );
            assert!(
                p.entry_excursion() < p.band_excursion(),
                "{id}: entry must be nearer the top than the bottom band"
            );
        }
    }

    #[test]
    fn deviation_is_signed_and_zero_inside() {
        let range = AngleRange::new(80.0, 178.0);
        assert!((range.deviation(100.0)).abs() < f64::EPSILON);
        assert!((range.deviation(70.0) - (-10.0)).abs() < f64::EPSILON);
        assert!((range.deviation(180.0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn register_rejects_inconsistent_profile() {
        let mut profile = super::squat_profile();
        profile.return_deg = 100.0; // below entry in excursion space
        let mut registry = ProfileRegistry::new();
        assert!(registry.register(profile).is_err());
    }

    #[test]
    fn required_joints_are_deduplicated() {
        let squat = super::squat_profile();
        let joints = squat.required_joints();
        let hips = joints
            .iter()
            .filter(|j| **j == JointId::RightHip)
            .count();
        assert_eq!(hips, 1);
    }

    #[test]
    fn exercise_id_round_trips_through_str() {
        for &id in ExerciseId::all() {
            let parsed: ExerciseId = id.name().parse().unwrap();
            assert_eq!(parsed, id);
        }
        assert!("push_up".parse::<ExerciseId>().is_err());
    }
}
