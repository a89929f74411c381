//! Session control: frame routing, aggregation, and snapshot delivery.
//!
//! One controller owns exactly one active exercise session at a time.
//! Frame processing is serialized by an internal lock, so producers on a
//! capture thread can call in concurrently without interleaving state
//! updates. Snapshot delivery is fire-and-forget through a broadcast
//! channel: a subscriber that cannot keep up loses old snapshots rather
//! than stalling the pipeline.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use formsense_core::{ExerciseId, ExerciseProfile, PoseFrame, ProfileRegistry, SessionId};
use formsense_signal::SignalConditioner;

use crate::events::{EventLog, SessionEvent};
use crate::form::{FormScorer, FormStatus};
use crate::metrics::SessionMetrics;
use crate::rep::RepTracker;
use crate::snapshot::SessionSnapshot;
use crate::{EngineConfig, EngineError};

/// State owned by the currently active exercise session.
struct ActiveSession {
    session_id: SessionId,
    profile: ExerciseProfile,
    conditioner: SignalConditioner,
    tracker: RepTracker,
    last_seq: Option<u64>,
    last_form: FormStatus,
    last_depth_whole: i64,
    /// `None` until the primary angle has ever been valid.
    signal_ok: Option<bool>,
    snapshot: SessionSnapshot,
    ended: bool,
}

impl ActiveSession {
    fn start(profile: ExerciseProfile, config: &EngineConfig) -> Self {
        let session_id = SessionId::new();
        let conditioner = SignalConditioner::for_profile(&profile, config.conditioner_config());
        let tracker = RepTracker::new(&profile, config.dwell_ms);
        let snapshot = SessionSnapshot::initial(session_id, profile.id);
        Self {
            session_id,
            profile,
            conditioner,
            tracker,
            last_seq: None,
            last_form: FormStatus::Unknown,
            last_depth_whole: 0,
            signal_ok: None,
            snapshot,
            ended: false,
        }
    }
}

struct Inner {
    registry: ProfileRegistry,
    config: EngineConfig,
    state: Mutex<ActiveSession>,
    events: Mutex<EventLog>,
    metrics: Mutex<SessionMetrics>,
    broadcast_tx: broadcast::Sender<SessionSnapshot>,
    scorer: FormScorer,
}

/// Controller for one live analysis stream.
///
/// Cheap to clone; clones share the same session state, so a capture
/// thread and a control surface can hold their own handles.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Creates a controller with an initial exercise selected.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Profile`] if the initial exercise is not in
    /// the registry.
    pub fn new(
        registry: ProfileRegistry,
        config: EngineConfig,
        initial: ExerciseId,
    ) -> Result<Self, EngineError> {
        let profile = registry.lookup(initial)?.clone();
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_capacity);
        let session = ActiveSession::start(profile, &config);

        let mut events = EventLog::new(config.event_log_capacity);
        events.append(SessionEvent::ExerciseSelected {
            session_id: session.session_id,
            exercise: initial,
            timestamp_ms: 0,
        });

        tracing::info!(exercise = %initial, session_id = %session.session_id, "session started");

        Ok(Self {
            inner: Arc::new(Inner {
                scorer: FormScorer::new(config.form_tolerance_deg),
                registry,
                state: Mutex::new(session),
                events: Mutex::new(events),
                metrics: Mutex::new(SessionMetrics::new()),
                broadcast_tx,
                config,
            }),
        })
    }

    /// Switches to a new exercise, replacing all per-session state.
    ///
    /// Effective immediately: the repetition counter is zeroed, the
    /// filter state discarded, and a fresh session id assigned. On
    /// failure the previous session keeps running untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Profile`] if the identifier is not in the
    /// registry.
    pub fn select_exercise(&self, id: ExerciseId) -> Result<SessionSnapshot, EngineError> {
        // Look up before touching any state so an unknown id cannot
        // disturb the running session.
        let profile = self.inner.registry.lookup(id)?.clone();

        let mut state = self.inner.state.lock();
        *state = ActiveSession::start(profile, &self.inner.config);

        self.inner.events.lock().append(SessionEvent::ExerciseSelected {
            session_id: state.session_id,
            exercise: id,
            timestamp_ms: 0,
        });

        tracing::info!(exercise = %id, session_id = %state.session_id, "exercise selected");

        let snapshot = state.snapshot.clone();
        let _ = self.inner.broadcast_tx.send(snapshot.clone());
        Ok(snapshot)
    }

    /// Processes one pose frame and returns the resulting snapshot.
    ///
    /// Frames must arrive in strictly increasing sequence order; a frame
    /// whose sequence number is not greater than the last accepted one is
    /// rejected without touching any state, as is any frame arriving
    /// after [`SessionController::end_session`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StaleFrame`] for rejected frames.
    pub fn process_frame(&self, frame: PoseFrame) -> Result<SessionSnapshot, EngineError> {
        let mut state = self.inner.state.lock();

        let last_seq = state.last_seq.unwrap_or(0);
        if state.ended || state.last_seq.is_some_and(|last| frame.seq <= last) {
            self.inner.metrics.lock().frames_stale += 1;
            tracing::debug!(seq = frame.seq, last_seq, ended = state.ended, "stale frame rejected");
            return Err(EngineError::StaleFrame {
                seq: frame.seq,
                last_seq,
            });
        }
        state.last_seq = Some(frame.seq);

        let timestamp_ms = frame.timestamp_ms;
        let signal = state.conditioner.process(&frame);
        let primary = signal.primary();

        // Signal loss / recovery events for the primary angle.
        match (state.signal_ok, primary.valid) {
            (Some(true), false) => {
                self.inner
                    .events
                    .lock()
                    .append(SessionEvent::SignalLost { timestamp_ms });
                tracing::warn!(seq = frame.seq, "primary angle signal lost");
            }
            (Some(false), true) => {
                self.inner
                    .events
                    .lock()
                    .append(SessionEvent::SignalRestored { timestamp_ms });
                tracing::info!(seq = frame.seq, "primary angle signal restored");
            }
            _ => {}
        }
        if primary.valid || state.signal_ok.is_some() {
            state.signal_ok = Some(primary.valid);
        }

        let excursion = primary.value().map(|deg| state.profile.excursion(deg));
        let update = state.tracker.update(timestamp_ms, excursion);

        if let Some(completed) = update.completed {
            let exercise = state.profile.id;
            self.inner.events.lock().append(SessionEvent::RepCompleted {
                exercise,
                count: completed.count,
                cycle_ms: completed.cycle_ms,
                timestamp_ms,
            });
            self.inner.metrics.lock().reps_total += 1;
            tracing::info!(
                exercise = %exercise,
                reps = completed.count,
                cycle_ms = completed.cycle_ms,
                "repetition completed"
            );
        }

        let judgment = self.inner.scorer.judge(&state.profile, &signal);
        if judgment.status != state.last_form {
            self.inner.events.lock().append(SessionEvent::FormStatusChanged {
                previous: state.last_form,
                current: judgment.status,
                timestamp_ms,
            });
            state.last_form = judgment.status;
        }

        #[allow(clippy::cast_possible_truncation)]
        let depth_whole = update.depth_pct.round() as i64;
        if depth_whole != state.last_depth_whole {
            self.inner.events.lock().append(SessionEvent::DepthUpdated {
                depth_pct: update.depth_pct,
                timestamp_ms,
            });
            state.last_depth_whole = depth_whole;
        }

        {
            let mut metrics = self.inner.metrics.lock();
            metrics.frames_processed += 1;
            if !primary.valid {
                metrics.frames_invalid_signal += 1;
            }
        }

        let snapshot = SessionSnapshot {
            session_id: state.session_id,
            exercise: state.profile.id,
            phase: state.tracker.phase(),
            reps: state.tracker.reps(),
            depth_pct: update.depth_pct,
            form: judgment.status,
            severity: judgment.severity,
            cue: judgment.cue,
            last_seq: state.last_seq,
            timestamp_ms,
        };
        state.snapshot = snapshot.clone();
        drop(state);

        let _ = self.inner.broadcast_tx.send(snapshot.clone());
        Ok(snapshot)
    }

    /// The latest snapshot, for late subscribers joining mid-session.
    #[must_use]
    pub fn current_snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().snapshot.clone()
    }

    /// Registers a snapshot subscriber.
    ///
    /// Every processed frame's snapshot is delivered to every receiver.
    /// Dropping the receiver unsubscribes; a receiver that lags behind
    /// the channel capacity loses the oldest snapshots.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSnapshot> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.broadcast_tx.receiver_count()
    }

    /// The active session's identifier.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.state.lock().session_id
    }

    /// The active exercise.
    #[must_use]
    pub fn exercise(&self) -> ExerciseId {
        self.inner.state.lock().profile.id
    }

    /// All retained session events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.inner.events.lock().all()
    }

    /// Current processing counters.
    #[must_use]
    pub fn metrics(&self) -> SessionMetrics {
        self.inner.metrics.lock().clone()
    }

    /// Tears down the active session.
    ///
    /// Frames arriving afterwards are rejected with
    /// [`EngineError::StaleFrame`]; selecting an exercise starts a fresh
    /// session.
    pub fn end_session(&self) {
        let mut state = self.inner.state.lock();
        state.ended = true;
        tracing::info!(session_id = %state.session_id, "session ended");
    }

    /// Whether the active session has been torn down.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.inner.state.lock().ended
    }
}
