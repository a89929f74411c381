//! Repetition phase tracking.
//!
//! The tracker runs on the *normalized excursion* of the primary angle:
//! 0 at the profile's top (rest) angle, 1 at its bottom (full-depth)
//! angle. Working in excursion space means a squat (angle falling toward
//! the extreme) and jumping jacks (angle rising toward it) share one code
//! path; the profile's degree thresholds are converted once at session
//! start.
//!
//! The bottom dwell requirement is the anti-double-count safeguard: the
//! excursion must sit inside the bottom tolerance band continuously for
//! the configured dwell time before the bottom is credited, so jitter
//! crossings shorter than the dwell can never produce a repetition.

use serde::{Deserialize, Serialize};

use formsense_core::ExerciseProfile;

/// Movement phase of the current repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    /// At rest near the top position
    Idle,
    /// Moving toward the bottom extreme
    Descending,
    /// Holding within the bottom tolerance band (dwell satisfied)
    BottomHeld,
    /// Returning toward the top
    Ascending,
}

impl RepPhase {
    /// Returns the phase name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Descending => "descending",
            Self::BottomHeld => "bottom_held",
            Self::Ascending => "ascending",
        }
    }
}

impl std::fmt::Display for RepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Phase thresholds in excursion space, derived from a profile.
#[derive(Debug, Clone, Copy)]
struct Thresholds {
    entry: f64,
    ret: f64,
    band: f64,
}

impl Thresholds {
    fn from_profile(profile: &ExerciseProfile) -> Self {
        Self {
            entry: profile.entry_excursion(),
            ret: profile.return_excursion(),
            band: profile.band_excursion(),
        }
    }
}

/// A completed repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedRep {
    /// Total repetitions in the session after this one.
    pub count: u32,
    /// Duration of the full cycle, milliseconds on the frame clock.
    pub cycle_ms: u64,
}

/// Outcome of feeding one conditioned sample to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepUpdate {
    /// Phase transition taken this frame, if any.
    pub transition: Option<(RepPhase, RepPhase)>,
    /// Set when this frame completed a repetition.
    pub completed: Option<CompletedRep>,
    /// Depth percentage in [0, 100] (0 while the signal is invalid).
    pub depth_pct: f64,
}

/// Per-session repetition state machine.
///
/// One instance per (exercise, session) pair; reset or replaced when the
/// exercise changes. Feeding an invalid sample mid-cycle aborts the cycle
/// back to [`RepPhase::Idle`] with no credit — the engine prefers
/// undercounting to overcounting — and freezes there until the signal
/// recovers.
#[derive(Debug)]
pub struct RepTracker {
    thresholds: Thresholds,
    dwell_ms: u64,
    phase: RepPhase,
    reps: u32,
    band_entered_ms: Option<u64>,
    cycle_started_ms: Option<u64>,
    last_transition_ms: u64,
}

impl RepTracker {
    /// Creates a tracker for the given profile.
    #[must_use]
    pub fn new(profile: &ExerciseProfile, dwell_ms: u64) -> Self {
        Self {
            thresholds: Thresholds::from_profile(profile),
            dwell_ms,
            phase: RepPhase::Idle,
            reps: 0,
            band_entered_ms: None,
            cycle_started_ms: None,
            last_transition_ms: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    /// Repetitions completed this session. Non-decreasing until
    /// [`RepTracker::reset`].
    #[must_use]
    pub fn reps(&self) -> u32 {
        self.reps
    }

    /// Frame-clock time of the last phase transition.
    #[must_use]
    pub fn last_transition_ms(&self) -> u64 {
        self.last_transition_ms
    }

    /// Resets phase and counter (exercise change).
    pub fn reset(&mut self) {
        self.phase = RepPhase::Idle;
        self.reps = 0;
        self.band_entered_ms = None;
        self.cycle_started_ms = None;
        self.last_transition_ms = 0;
    }

    /// Advances the machine with one sample.
    ///
    /// `excursion` is the primary angle's normalized excursion, or `None`
    /// while the conditioned signal is invalid.
    pub fn update(&mut self, timestamp_ms: u64, excursion: Option<f64>) -> RepUpdate {
        let Some(e) = excursion else {
            return self.freeze(timestamp_ms);
        };

        let depth_pct = e.clamp(0.0, 1.0) * 100.0;
        let t = self.thresholds;
        let mut transition = None;
        let mut completed = None;

        match self.phase {
            RepPhase::Idle => {
                if e >= t.entry {
                    transition = Some(self.transition_to(RepPhase::Descending, timestamp_ms));
                    self.cycle_started_ms = Some(timestamp_ms);
                    self.band_entered_ms = None;
                }
            }
            RepPhase::Descending => {
                if e >= t.band {
                    let entered = *self.band_entered_ms.get_or_insert(timestamp_ms);
                    if timestamp_ms.saturating_sub(entered) >= self.dwell_ms {
                        transition = Some(self.transition_to(RepPhase::BottomHeld, timestamp_ms));
                    }
                } else {
                    self.band_entered_ms = None;
                    if e <= t.ret {
                        // Shallow attempt: back near the top without ever
                        // holding the bottom. No credit.
                        transition = Some(self.transition_to(RepPhase::Idle, timestamp_ms));
                        self.cycle_started_ms = None;
                    }
                }
            }
            RepPhase::BottomHeld => {
                if e < t.band {
                    transition = Some(self.transition_to(RepPhase::Ascending, timestamp_ms));
                }
            }
            RepPhase::Ascending => {
                if e >= t.band {
                    // Sank back into the band; the dwell already passed
                    // this cycle, and the counter only fires on the
                    // return crossing, so this cannot double-count.
                    transition = Some(self.transition_to(RepPhase::BottomHeld, timestamp_ms));
                } else if e <= t.ret {
                    self.reps += 1;
                    let cycle_ms = self
                        .cycle_started_ms
                        .map_or(0, |start| timestamp_ms.saturating_sub(start));
                    completed = Some(CompletedRep {
                        count: self.reps,
                        cycle_ms,
                    });
                    transition = Some(self.transition_to(RepPhase::Idle, timestamp_ms));
                    self.cycle_started_ms = None;
                    self.band_entered_ms = None;
                }
            }
        }

        RepUpdate {
            transition,
            completed,
            depth_pct,
        }
    }

    /// Invalid-signal handling: abort an in-flight cycle to Idle (no
    /// partial credit), then hold there. Depth reports 0 while invalid.
    fn freeze(&mut self, timestamp_ms: u64) -> RepUpdate {
        let transition = if self.phase != RepPhase::Idle {
            Some(self.transition_to(RepPhase::Idle, timestamp_ms))
        } else {
            None
        };
        self.cycle_started_ms = None;
        self.band_entered_ms = None;
        RepUpdate {
            transition,
            completed: None,
            depth_pct: 0.0,
        }
    }

    fn transition_to(&mut self, next: RepPhase, timestamp_ms: u64) -> (RepPhase, RepPhase) {
        let from = self.phase;
        self.phase = next;
        self.last_transition_ms = timestamp_ms;
        (from, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsense_core::{ExerciseId, ProfileRegistry};

    const FRAME_MS: u64 = 33;

    fn squat_tracker(dwell_ms: u64) -> (ExerciseProfile, RepTracker) {
        let profile = ProfileRegistry::builtin()
            .lookup(ExerciseId::Squat)
            .unwrap()
            .clone();
        let tracker = RepTracker::new(&profile, dwell_ms);
        (profile, tracker)
    }

    /// Feeds a sweep of primary-angle values at 30 fps.
    fn feed(
        tracker: &mut RepTracker,
        profile: &ExerciseProfile,
        start_ms: u64,
        angles: &[f64],
    ) -> (u64, Vec<RepUpdate>) {
        let mut ts = start_ms;
        let mut updates = Vec::new();
        for &angle in angles {
            updates.push(tracker.update(ts, Some(profile.excursion(angle))));
            ts += FRAME_MS;
        }
        (ts, updates)
    }

    fn clean_cycle_angles() -> Vec<f64> {
        let mut angles = Vec::new();
        // Descend 170 -> 85 over 10 frames.
        for i in 0..10 {
            angles.push(170.0 - f64::from(i) * 8.5);
        }
        // Hold the bottom for 8 frames (~264 ms, past the 150 ms dwell).
        for _ in 0..8 {
            angles.push(85.0);
        }
        // Ascend back to standing.
        for i in 0..10 {
            angles.push(85.0 + f64::from(i + 1) * 8.5);
        }
        angles
    }

    #[test]
    fn clean_cycle_counts_exactly_one_rep() {
        let (profile, mut tracker) = squat_tracker(150);
        let (_, updates) = feed(&mut tracker, &profile, 0, &clean_cycle_angles());

        assert_eq!(tracker.reps(), 1);
        assert_eq!(tracker.phase(), RepPhase::Idle);
        let completions: Vec<_> = updates.iter().filter_map(|u| u.completed).collect();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].count, 1);
        assert!(completions[0].cycle_ms > 0);
    }

    #[test]
    fn sub_dwell_jitter_at_the_bottom_does_not_count() {
        let (profile, mut tracker) = squat_tracker(150);

        // Descend into the band, then oscillate across the band edge so
        // no in-band run lasts 150 ms (band edge for the squat is 115°).
        let mut angles = vec![170.0, 150.0, 130.0, 120.0];
        for _ in 0..6 {
            angles.push(112.0); // in band for one frame (33 ms)
            angles.push(118.0); // out again
        }
        // Straight back up.
        angles.extend([130.0, 150.0, 165.0, 170.0]);

        let (_, updates) = feed(&mut tracker, &profile, 0, &angles);
        assert_eq!(tracker.reps(), 0, "jitter crossings must not count");
        assert!(updates.iter().all(|u| u.completed.is_none()));
        assert_eq!(tracker.phase(), RepPhase::Idle);
    }

    #[test]
    fn dwell_of_two_frames_requires_both_in_band() {
        let (profile, mut tracker) = squat_tracker(60);

        // One frame in the band: 0 ms elapsed at first sight, 33 ms at
        // the second sample which is already outside.
        feed(&mut tracker, &profile, 0, &[170.0, 130.0, 110.0, 120.0]);
        assert_eq!(tracker.phase(), RepPhase::Descending);

        // Three consecutive in-band frames span 66 ms >= 60 ms.
        feed(&mut tracker, &profile, 200, &[110.0, 110.0, 110.0]);
        assert_eq!(tracker.phase(), RepPhase::BottomHeld);
    }

    #[test]
    fn shallow_attempt_returns_to_idle_without_credit() {
        let (profile, mut tracker) = squat_tracker(150);
        feed(
            &mut tracker,
            &profile,
            0,
            &[170.0, 145.0, 130.0, 125.0, 140.0, 155.0, 165.0, 170.0],
        );
        assert_eq!(tracker.reps(), 0);
        assert_eq!(tracker.phase(), RepPhase::Idle);
    }

    #[test]
    fn depth_is_always_clamped() {
        let (profile, mut tracker) = squat_tracker(150);
        for angle in [200.0, 179.0, 90.0, 60.0, -10.0] {
            let update = tracker.update(0, Some(profile.excursion(angle)));
            assert!(
                (0.0..=100.0).contains(&update.depth_pct),
                "angle {angle} gave depth {}",
                update.depth_pct
            );
        }
    }

    #[test]
    fn invalid_signal_mid_cycle_aborts_without_credit() {
        let (profile, mut tracker) = squat_tracker(150);
        let (ts, _) = feed(&mut tracker, &profile, 0, &[170.0, 140.0, 120.0, 110.0]);
        assert_eq!(tracker.phase(), RepPhase::Descending);

        let update = tracker.update(ts, None);
        assert_eq!(tracker.phase(), RepPhase::Idle);
        assert_eq!(update.transition, Some((RepPhase::Descending, RepPhase::Idle)));
        assert!((update.depth_pct).abs() < f64::EPSILON);

        // Frozen while invalid: no transitions, no credit.
        let update = tracker.update(ts + FRAME_MS, None);
        assert!(update.transition.is_none());
        assert_eq!(tracker.reps(), 0);
    }

    #[test]
    fn counter_is_monotonic_across_cycles() {
        let (profile, mut tracker) = squat_tracker(150);
        let cycle = clean_cycle_angles();
        let mut ts = 0;
        for expected in 1..=3 {
            let (next_ts, _) = feed(&mut tracker, &profile, ts, &cycle);
            ts = next_ts + 200;
            assert_eq!(tracker.reps(), expected);
        }
    }

    #[test]
    fn reset_zeroes_reps_and_phase() {
        let (profile, mut tracker) = squat_tracker(150);
        feed(&mut tracker, &profile, 0, &clean_cycle_angles());
        assert_eq!(tracker.reps(), 1);

        tracker.reset();
        assert_eq!(tracker.reps(), 0);
        assert_eq!(tracker.phase(), RepPhase::Idle);
    }

    #[test]
    fn rising_angle_exercise_counts_with_the_same_machine() {
        let profile = ProfileRegistry::builtin()
            .lookup(ExerciseId::JumpingJacks)
            .unwrap()
            .clone();
        let mut tracker = RepTracker::new(&profile, 150);

        let mut angles = Vec::new();
        // Arms sweep up 40 -> 150 over 10 frames.
        for i in 0..10 {
            angles.push(40.0 + f64::from(i) * 11.0);
        }
        // Overhead hold.
        for _ in 0..8 {
            angles.push(150.0);
        }
        // Back down to the sides.
        for i in 0..10 {
            angles.push(150.0 - f64::from(i + 1) * 11.0);
        }

        let mut ts = 0;
        for &angle in &angles {
            tracker.update(ts, Some(profile.excursion(angle)));
            ts += FRAME_MS;
        }
        assert_eq!(tracker.reps(), 1);
    }
}
