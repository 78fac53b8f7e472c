// Job controller
//
// The state machine tying builder, dispatcher, tracker and aggregator
// together. This is the only component collaborators (CLI, UI) address
// directly. A single job is active at a time; submitting while one is in
// flight implicitly resets it first, and an outcome arriving for a job
// that is no longer active is discarded by id.

use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::{aggregate, Aggregated, FailedTask, TranslatedAsset};
use crate::config::ProgressConfig;
use crate::dispatch::{EngineOutcome, TaskDispatcher};
use crate::error::ValidationError;
use crate::job::{Asset, Job, JobBuilder, JobState};
use crate::language::LanguageCode;
use crate::progress::{ProgressSnapshot, ProgressTracker};

/// Controller lifecycle phase as seen by collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Validating,
    Submitted,
    InProgress,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, JobPhase::Submitted | JobPhase::InProgress)
    }
}

/// Job-level terminal errors. Task-level failures are absorbed into the
/// aggregated result set instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("engine transport failure: {0}")]
    Transport(String),

    #[error("no tasks succeeded")]
    NoTasksSucceeded,
}

/// Opaque reference to a submitted job, handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: Uuid,
    pub task_count: usize,
}

struct ActiveJob {
    job: Job,
    tracker: ProgressTracker,
    results: Option<Aggregated>,
    error: Option<JobError>,
}

struct ControllerInner {
    active: Option<ActiveJob>,
}

pub struct JobController {
    dispatcher: Arc<TaskDispatcher>,
    progress_config: ProgressConfig,
    inner: Arc<Mutex<ControllerInner>>,
    phase_tx: watch::Sender<JobPhase>,
    phase_rx: watch::Receiver<JobPhase>,
}

impl JobController {
    pub fn new(dispatcher: TaskDispatcher, progress_config: ProgressConfig) -> Self {
        let (phase_tx, phase_rx) = watch::channel(JobPhase::Idle);
        Self {
            dispatcher: Arc::new(dispatcher),
            progress_config,
            inner: Arc::new(Mutex::new(ControllerInner { active: None })),
            phase_tx,
            phase_rx,
        }
    }

    /// Validate the request, build the job and dispatch it. Any previous
    /// job is implicitly reset first. Returns synchronously once the
    /// dispatch task is outstanding; progress and results are observed
    /// through the handle.
    pub fn request_translation(
        &self,
        assets: Vec<Asset>,
        source: LanguageCode,
        targets: &[LanguageCode],
    ) -> std::result::Result<JobHandle, ValidationError> {
        {
            let mut inner = self.inner.lock().expect("controller lock poisoned");
            if let Some(mut previous) = inner.active.take() {
                info!("Resetting previous job {} before new request", previous.job.id);
                previous.tracker.stop();
            }
        }

        let _ = self.phase_tx.send(JobPhase::Validating);

        let mut job = match JobBuilder::build(assets, source, targets) {
            Ok(job) => job,
            Err(e) => {
                // Back to idle; the error is surfaced to the caller and no
                // engine call has happened.
                let _ = self.phase_tx.send(JobPhase::Idle);
                return Err(e);
            }
        };

        let job_id = job.id;
        let task_count = job.task_count();
        job.state = JobState::Submitted;

        info!(
            "Job {} submitted: {} assets x {} languages = {} tasks",
            job_id,
            job.assets.len(),
            job.targets.len(),
            task_count
        );

        // Entering the in-flight state starts both progress timers; every
        // exit from it stops them.
        let mut tracker = ProgressTracker::new(job_id, &self.progress_config);
        tracker.start();

        let dispatch_job = job.clone();
        {
            let mut inner = self.inner.lock().expect("controller lock poisoned");
            inner.active = Some(ActiveJob {
                job,
                tracker,
                results: None,
                error: None,
            });
        }
        let _ = self.phase_tx.send(JobPhase::Submitted);

        let dispatcher = Arc::clone(&self.dispatcher);
        let inner = Arc::clone(&self.inner);
        let phase_tx = self.phase_tx.clone();
        tokio::spawn(async move {
            // The request is now outstanding.
            if mark_in_progress(&inner, job_id) {
                let _ = phase_tx.send(JobPhase::InProgress);
            }

            // Sole suspension point of the pipeline.
            let outcome = dispatcher.submit(&dispatch_job).await;

            settle(&inner, &phase_tx, job_id, outcome);
        });

        Ok(JobHandle { job_id, task_count })
    }

    pub fn phase(&self) -> JobPhase {
        *self.phase_rx.borrow()
    }

    /// Watch the controller phase; useful for awaiting a terminal state.
    pub fn subscribe_phase(&self) -> watch::Receiver<JobPhase> {
        self.phase_rx.clone()
    }

    /// Wait until the active job reaches `Completed` or `Failed`.
    pub async fn wait_terminal(&self) -> JobPhase {
        let mut rx = self.phase_rx.clone();
        let phase = rx.wait_for(|p| p.is_terminal()).await;
        match phase {
            Ok(p) => *p,
            Err(_) => self.phase(),
        }
    }

    /// Current progress snapshot for the given job, if it is still the
    /// active one.
    pub fn snapshot(&self, handle: &JobHandle) -> Option<ProgressSnapshot> {
        let inner = self.inner.lock().expect("controller lock poisoned");
        inner
            .active
            .as_ref()
            .filter(|a| a.job.id == handle.job_id)
            .map(|a| a.tracker.snapshot())
    }

    /// Stream of progress snapshots for the given job.
    pub fn subscribe_progress(&self, handle: &JobHandle) -> Option<watch::Receiver<ProgressSnapshot>> {
        let inner = self.inner.lock().expect("controller lock poisoned");
        inner
            .active
            .as_ref()
            .filter(|a| a.job.id == handle.job_id)
            .map(|a| a.tracker.subscribe())
    }

    /// Translated assets, available once the job completed.
    pub fn results(&self, handle: &JobHandle) -> Option<Vec<TranslatedAsset>> {
        let inner = self.inner.lock().expect("controller lock poisoned");
        inner
            .active
            .as_ref()
            .filter(|a| a.job.id == handle.job_id && a.job.state == JobState::Completed)
            .and_then(|a| a.results.as_ref())
            .map(|r| r.translated.clone())
    }

    /// Per-task failures from the aggregated result set.
    pub fn failed_tasks(&self, handle: &JobHandle) -> Vec<FailedTask> {
        let inner = self.inner.lock().expect("controller lock poisoned");
        inner
            .active
            .as_ref()
            .filter(|a| a.job.id == handle.job_id)
            .and_then(|a| a.results.as_ref())
            .map(|r| r.failed.clone())
            .unwrap_or_default()
    }

    /// Terminal job-level error, once the job failed.
    pub fn error(&self, handle: &JobHandle) -> Option<JobError> {
        let inner = self.inner.lock().expect("controller lock poisoned");
        inner
            .active
            .as_ref()
            .filter(|a| a.job.id == handle.job_id)
            .and_then(|a| a.error.clone())
    }

    /// Cancel any running progress timers, discard the current job and any
    /// partial results, and return to idle. Valid from every state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("controller lock poisoned");
        if let Some(mut active) = inner.active.take() {
            info!("Reset: discarding job {}", active.job.id);
            active.tracker.stop();
        }
        drop(inner);
        let _ = self.phase_tx.send(JobPhase::Idle);
    }
}

fn mark_in_progress(inner: &Arc<Mutex<ControllerInner>>, job_id: Uuid) -> bool {
    let mut inner = inner.lock().expect("controller lock poisoned");
    match inner.active.as_mut() {
        Some(active) if active.job.id == job_id => {
            active.job.state = JobState::InProgress;
            true
        }
        _ => false,
    }
}

/// Apply the engine outcome to the active job. Outcomes for a job that
/// has been reset in the meantime are discarded.
fn settle(
    inner: &Arc<Mutex<ControllerInner>>,
    phase_tx: &watch::Sender<JobPhase>,
    job_id: Uuid,
    outcome: EngineOutcome,
) {
    let mut guard = inner.lock().expect("controller lock poisoned");
    let Some(active) = guard.active.as_mut().filter(|a| a.job.id == job_id) else {
        debug!("Discarding late outcome for job {}", job_id);
        return;
    };

    match outcome {
        EngineOutcome::Transport(message) => {
            warn!("Job {} failed in transport: {}", job_id, message);
            active.tracker.stop();
            active.job.state = JobState::Failed;
            active.error = Some(JobError::Transport(message));
            let _ = phase_tx.send(JobPhase::Failed);
        }
        outcome @ EngineOutcome::Batch(_) => {
            let aggregated = aggregate(&mut active.job, &outcome);
            if aggregated.any_succeeded() {
                info!(
                    "Job {} completed: {} succeeded, {} failed",
                    job_id,
                    aggregated.translated.len(),
                    aggregated.failed.len()
                );
                active.tracker.finish();
                active.job.state = JobState::Completed;
                active.results = Some(aggregated);
                let _ = phase_tx.send(JobPhase::Completed);
            } else {
                warn!("Job {} failed: no tasks succeeded", job_id);
                active.tracker.stop();
                active.job.state = JobState::Failed;
                active.results = Some(aggregated);
                active.error = Some(JobError::NoTasksSucceeded);
                let _ = phase_tx.send(JobPhase::Failed);
            }
        }
    }
}
