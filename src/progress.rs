// Synthesized progress feedback
//
// The engine returns only a final batch result, so user-facing progress
// is estimated locally: a decelerating random-increment curve that never
// reaches 100 on its own. Completion is set exclusively by the controller
// once a confirmed terminal outcome exists, never self-declared here.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ProgressConfig;

/// Status messages shown while a batch is in flight, mapped from the
/// estimate via equal-width buckets over [0, 100).
pub const STATUS_LABELS: [&str; 8] = [
    "Preparing assets...",
    "Extracting audio...",
    "Processing source language...",
    "Transcribing content...",
    "Translating content...",
    "Generating speech...",
    "Syncing audio with media...",
    "Finalizing assets...",
];

pub const COMPLETE_LABEL: &str = "All assets translated!";

/// Point-in-time progress estimate. Recomputed each tick, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub job_id: Uuid,
    pub fraction_complete: f64,
    pub status_label: &'static str,
    pub elapsed_seconds: u64,
}

impl ProgressSnapshot {
    /// Elapsed time formatted as mm:ss.
    pub fn elapsed_display(&self) -> String {
        let mins = self.elapsed_seconds / 60;
        let secs = self.elapsed_seconds % 60;
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Pure estimator over a value in [0, 99]. Each tick consumes one uniform
/// draw from [0, 1); the increment shrinks as the value approaches the
/// ceiling, so the curve decelerates without ever stalling.
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    current: f64,
    ceiling: f64,
}

impl ProgressEstimator {
    pub fn new(ceiling: f64) -> Self {
        Self {
            current: 0.0,
            ceiling: ceiling.max(100.0),
        }
    }

    /// Advance by one tick. `draw` must be a uniform sample in [0, 1).
    pub fn advance(&mut self, draw: f64) -> f64 {
        let increment = draw * (1.0 - self.current / self.ceiling);
        self.current = (self.current + increment).min(99.0);
        self.current
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn label(&self) -> &'static str {
        let index = ((self.current / 100.0) * STATUS_LABELS.len() as f64) as usize;
        STATUS_LABELS[index.min(STATUS_LABELS.len() - 1)]
    }
}

struct TrackerState {
    estimator: ProgressEstimator,
    elapsed_seconds: u64,
    finished: bool,
}

impl TrackerState {
    fn snapshot(&self, job_id: Uuid) -> ProgressSnapshot {
        if self.finished {
            ProgressSnapshot {
                job_id,
                fraction_complete: 1.0,
                status_label: COMPLETE_LABEL,
                elapsed_seconds: self.elapsed_seconds,
            }
        } else {
            ProgressSnapshot {
                job_id,
                fraction_complete: self.estimator.current() / 100.0,
                status_label: self.estimator.label(),
                elapsed_seconds: self.elapsed_seconds,
            }
        }
    }
}

/// Drives two periodic activities while a job is in flight: the progress
/// estimate tick and a once-per-second elapsed counter. Both are started
/// together and must be cancelled together on any exit from the in-flight
/// state; leaving either running is a resource leak.
pub struct ProgressTracker {
    job_id: Uuid,
    tick_interval: Duration,
    state: Arc<Mutex<TrackerState>>,
    tx: watch::Sender<ProgressSnapshot>,
    rx: watch::Receiver<ProgressSnapshot>,
    handles: Vec<JoinHandle<()>>,
}

impl ProgressTracker {
    pub fn new(job_id: Uuid, config: &ProgressConfig) -> Self {
        let state = TrackerState {
            estimator: ProgressEstimator::new(config.ceiling),
            elapsed_seconds: 0,
            finished: false,
        };
        let (tx, rx) = watch::channel(state.snapshot(job_id));

        Self {
            job_id,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            state: Arc::new(Mutex::new(state)),
            tx,
            rx,
            handles: Vec::new(),
        }
    }

    /// Start both periodic activities. Idempotent once running.
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            return;
        }

        let job_id = self.job_id;

        let state = Arc::clone(&self.state);
        let tx = self.tx.clone();
        let tick_interval = self.tick_interval;
        self.handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                let snapshot = {
                    let mut state = state.lock().expect("tracker state lock poisoned");
                    if state.finished {
                        break;
                    }
                    state.estimator.advance(rand::random::<f64>());
                    state.snapshot(job_id)
                };
                let _ = tx.send(snapshot);
            }
        }));

        let state = Arc::clone(&self.state);
        let tx = self.tx.clone();
        self.handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await;
            loop {
                interval.tick().await;
                let snapshot = {
                    let mut state = state.lock().expect("tracker state lock poisoned");
                    if state.finished {
                        break;
                    }
                    state.elapsed_seconds += 1;
                    state.snapshot(job_id)
                };
                let _ = tx.send(snapshot);
            }
        }));
    }

    /// Stop both timers without declaring completion. Used on failure and
    /// reset; the last published estimate stays below 1.0.
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    /// Stop both timers and force the estimate to exactly 100. Only the
    /// controller calls this, and only on a confirmed terminal outcome.
    pub fn finish(&mut self) {
        self.stop();
        let snapshot = {
            let mut state = self.state.lock().expect("tracker state lock poisoned");
            state.finished = true;
            state.snapshot(self.job_id)
        };
        let _ = self.tx.send(snapshot);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state
            .lock()
            .expect("tracker state lock poisoned")
            .snapshot(self.job_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.rx.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(
            Uuid::new_v4(),
            &ProgressConfig {
                tick_interval_ms: 300,
                ceiling: 120.0,
            },
        )
    }

    #[test]
    fn test_estimator_monotone_and_bounded() {
        let mut estimator = ProgressEstimator::new(120.0);
        let mut rng = StdRng::seed_from_u64(7);
        let mut previous = 0.0;
        for _ in 0..10_000 {
            let value = estimator.advance(rng.gen::<f64>());
            assert!(value >= previous);
            assert!(value <= 99.0);
            previous = value;
        }
        // After many ticks the curve should be resting at the cap
        assert!(previous > 90.0);
    }

    #[test]
    fn test_estimator_decelerates() {
        let mut estimator = ProgressEstimator::new(120.0);
        let early = estimator.advance(0.5);
        for _ in 0..5_000 {
            estimator.advance(0.5);
        }
        let before = estimator.current();
        let late_increment = estimator.advance(0.5) - before;
        assert!(late_increment < early);
    }

    #[test]
    fn test_label_ladder() {
        let mut estimator = ProgressEstimator::new(1_000_000.0);
        assert_eq!(estimator.label(), STATUS_LABELS[0]);
        while estimator.current() < 95.0 {
            estimator.advance(0.999);
        }
        assert_eq!(estimator.label(), STATUS_LABELS[7]);
    }

    #[test]
    fn test_elapsed_display_format() {
        let snapshot = ProgressSnapshot {
            job_id: Uuid::new_v4(),
            fraction_complete: 0.5,
            status_label: STATUS_LABELS[0],
            elapsed_seconds: 65,
        };
        assert_eq!(snapshot.elapsed_display(), "01:05");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_advance_and_stay_below_one() {
        let mut tracker = tracker();
        tracker.start();

        // Slightly past the 5 s boundary so the fifth elapsed tick has
        // been processed regardless of wakeup order
        tokio::time::sleep(Duration::from_millis(5_100)).await;

        let snapshot = tracker.snapshot();
        assert!(snapshot.fraction_complete > 0.0);
        assert!(snapshot.fraction_complete < 1.0);
        assert_eq!(snapshot.elapsed_seconds, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_are_monotone() {
        let mut tracker = tracker();
        tracker.start();

        let mut previous = 0.0;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let snapshot = tracker.snapshot();
            assert!(snapshot.fraction_complete >= previous);
            previous = snapshot.fraction_complete;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_both_timers() {
        let mut tracker = tracker();
        tracker.start();
        tokio::time::sleep(Duration::from_secs(2)).await;
        tracker.stop();
        assert!(!tracker.is_running());

        let frozen = tracker.snapshot();
        tokio::time::sleep(Duration::from_secs(10)).await;
        let after = tracker.snapshot();
        assert_eq!(frozen.fraction_complete, after.fraction_complete);
        assert_eq!(frozen.elapsed_seconds, after.elapsed_seconds);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_forces_exactly_one() {
        let mut tracker = tracker();
        tracker.start();
        tokio::time::sleep(Duration::from_secs(1)).await;

        tracker.finish();
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.fraction_complete, 1.0);
        assert_eq!(snapshot.status_label, COMPLETE_LABEL);
        assert!(!tracker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_sees_final_snapshot() {
        let mut tracker = tracker();
        let rx = tracker.subscribe();
        tracker.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        tracker.finish();

        let last = rx.borrow().clone();
        assert_eq!(last.fraction_complete, 1.0);
    }
}
