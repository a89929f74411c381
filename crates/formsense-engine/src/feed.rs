//! Bounded frame queue between capture and processing.
//!
//! Frame capture usually runs on its own thread; the feed decouples it
//! from processing with a bounded queue that never blocks the producer.
//! When the queue is full the *oldest* pending frame is dropped — for a
//! live display, recency matters more than completeness — and the drop is
//! counted, not errored.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use formsense_core::PoseFrame;

use crate::session::SessionController;
use crate::EngineError;

/// Default queue capacity: a quarter second of pending frames at 30 fps
/// is already more latency than a live display wants.
pub const DEFAULT_FEED_CAPACITY: usize = 8;

/// Counters for one feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedStats {
    /// Frames accepted into the queue
    pub frames_pushed: u64,
    /// Frames dropped because the queue was full
    pub frames_dropped: u64,
}

struct Shared {
    queue: Mutex<VecDeque<PoseFrame>>,
    notify: Notify,
    capacity: usize,
    pushed: AtomicU64,
    dropped: AtomicU64,
    closed: AtomicBool,
}

/// Producer handle for a [`FrameFeed`]. Cheap to clone.
#[derive(Clone)]
pub struct FeedHandle {
    shared: Arc<Shared>,
}

impl FeedHandle {
    /// Enqueues a frame without blocking.
    ///
    /// Returns `false` if the feed is closed. When the queue is full the
    /// oldest pending frame is dropped to make room.
    pub fn push(&self, frame: PoseFrame) -> bool {
        if self.shared.closed.load(Ordering::Acquire) {
            return false;
        }

        {
            let mut queue = self.shared.queue.lock();
            if queue.len() >= self.shared.capacity {
                queue.pop_front();
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(capacity = self.shared.capacity, "feed full, dropped oldest frame");
            }
            queue.push_back(frame);
        }
        self.shared.pushed.fetch_add(1, Ordering::Relaxed);
        self.shared.notify.notify_one();
        true
    }

    /// Closes the feed. The drain task finishes the queued frames and
    /// stops; further pushes are refused.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.notify.notify_one();
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> FeedStats {
        FeedStats {
            frames_pushed: self.shared.pushed.load(Ordering::Relaxed),
            frames_dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Bounded drop-oldest queue feeding a [`SessionController`].
pub struct FrameFeed {
    shared: Arc<Shared>,
}

impl FrameFeed {
    /// Creates a feed with the given queue capacity (min 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
                notify: Notify::new(),
                capacity: capacity.max(1),
                pushed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// A producer handle for this feed.
    #[must_use]
    pub fn handle(&self) -> FeedHandle {
        FeedHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> FeedStats {
        FeedStats {
            frames_pushed: self.shared.pushed.load(Ordering::Relaxed),
            frames_dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }

    /// Drains frames into the controller until the feed is closed and
    /// the queue is empty.
    ///
    /// Stale-frame rejections are expected during exercise switches and
    /// producer restarts; they are logged and counted by the controller,
    /// never propagated.
    pub async fn run(self, controller: SessionController) {
        loop {
            loop {
                let frame = self.shared.queue.lock().pop_front();
                let Some(frame) = frame else { break };
                match controller.process_frame(frame) {
                    Ok(_) => {}
                    Err(EngineError::StaleFrame { seq, .. }) => {
                        tracing::debug!(seq, "feed skipped stale frame");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "frame processing failed");
                    }
                }
            }

            if self.shared.closed.load(Ordering::Acquire)
                && self.shared.queue.lock().is_empty()
            {
                break;
            }
            self.shared.notify.notified().await;
        }
    }

    /// Spawns the drain task on the current tokio runtime.
    #[must_use]
    pub fn spawn(self, controller: SessionController) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(controller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use formsense_core::{ExerciseId, ProfileRegistry};

    fn controller() -> SessionController {
        SessionController::new(
            ProfileRegistry::builtin(),
            EngineConfig::default(),
            ExerciseId::Squat,
        )
        .unwrap()
    }

    #[test]
    fn test_push_beyond_capacity_drops_oldest() {
        let feed = FrameFeed::new(3);
        let handle = feed.handle();

        for seq in 1..=5 {
            assert!(handle.push(PoseFrame::new(seq, seq * 33)));
        }

        let stats = feed.stats();
        assert_eq!(stats.frames_pushed, 5);
        assert_eq!(stats.frames_dropped, 2);

        // The oldest two (1, 2) were dropped; the head is 3.
        let head = feed.shared.queue.lock().front().map(|f| f.seq);
        assert_eq!(head, Some(3));
    }

    #[test]
    fn test_push_after_close_is_refused() {
        let feed = FrameFeed::new(3);
        let handle = feed.handle();
        handle.close();
        assert!(!handle.push(PoseFrame::new(1, 33)));
        assert_eq!(feed.stats().frames_pushed, 0);
    }

    #[tokio::test]
    async fn test_run_drains_queue_into_controller() {
        let controller = controller();
        let feed = FrameFeed::new(16);
        let handle = feed.handle();

        for seq in 1..=10 {
            handle.push(PoseFrame::new(seq, seq * 33));
        }
        handle.close();

        feed.run(controller.clone()).await;
        assert_eq!(controller.metrics().frames_processed, 10);
        assert_eq!(controller.current_snapshot().last_seq, Some(10));
    }

    #[tokio::test]
    async fn test_stale_frames_are_skipped_not_fatal() {
        let controller = controller();
        // Pre-consume sequence 5 directly.
        controller.process_frame(PoseFrame::new(5, 165)).unwrap();

        let feed = FrameFeed::new(16);
        let handle = feed.handle();
        handle.push(PoseFrame::new(3, 99)); // stale
        handle.push(PoseFrame::new(6, 198)); // fresh
        handle.close();

        feed.run(controller.clone()).await;
        let metrics = controller.metrics();
        assert_eq!(metrics.frames_stale, 1);
        assert_eq!(controller.current_snapshot().last_seq, Some(6));
    }

    #[tokio::test]
    async fn test_spawned_task_processes_pushes() {
        let controller = controller();
        let feed = FrameFeed::new(8);
        let handle = feed.handle();
        let task = feed.spawn(controller.clone());

        for seq in 1..=4 {
            handle.push(PoseFrame::new(seq, seq * 33));
        }
        handle.close();
        task.await.unwrap();

        assert_eq!(controller.metrics().frames_processed, 4);
    }
}
