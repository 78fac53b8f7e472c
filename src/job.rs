use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TaskError, ValidationError};
use crate::language::LanguageCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
}

/// An uploaded media file submitted for translation. Immutable once it is
/// part of a Job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: u64,
    pub kind: MediaKind,
}

impl Asset {
    pub fn new(name: impl Into<String>, size_bytes: u64, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size_bytes,
            kind,
        }
    }

    /// Base filename without extension, used as the default result title.
    pub fn base_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// The unit of work for one (asset, target language) pair. Owned
/// exclusively by its Job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub asset_index: usize,
    pub target: LanguageCode,
    pub state: TaskState,
    pub result: Option<String>,
    pub error: Option<TaskError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Created,
    Submitted,
    InProgress,
    Completed,
    Failed,
}

/// A validated batch of tasks created from one translate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub assets: Vec<Asset>,
    pub source: LanguageCode,
    pub targets: Vec<LanguageCode>,
    pub tasks: Vec<Task>,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.state == TaskState::Succeeded)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.state == TaskState::Failed)
            .count()
    }

    /// A job is terminal only once every task is terminal.
    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.state.is_terminal())
    }
}

/// Short random id component. Uniqueness is only needed within a job's
/// lifetime, not unpredictability.
pub(crate) fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..7].to_string()
}

/// Validates raw input and constructs an immutable Job as the
/// asset x target-language cross-product.
pub struct JobBuilder;

impl JobBuilder {
    /// Build a Job or fail with a validation error. No partial Job is ever
    /// produced; duplicate targets are collapsed preserving first-seen
    /// order.
    pub fn build(
        assets: Vec<Asset>,
        source: LanguageCode,
        targets: &[LanguageCode],
    ) -> std::result::Result<Job, ValidationError> {
        if assets.is_empty() {
            return Err(ValidationError::EmptyAssets);
        }

        let mut unique_targets: Vec<LanguageCode> = Vec::new();
        for target in targets {
            if target.is_source_only() {
                return Err(ValidationError::AutoTarget);
            }
            if !unique_targets.contains(target) {
                unique_targets.push(*target);
            }
        }

        if unique_targets.is_empty() {
            return Err(ValidationError::EmptyTargets);
        }

        // Cross-product in assets-major order, so task order is
        // deterministic for a given input order.
        let mut tasks = Vec::with_capacity(assets.len() * unique_targets.len());
        let mut seq = 0u32;
        for (asset_index, asset) in assets.iter().enumerate() {
            for target in &unique_targets {
                tasks.push(Task {
                    id: format!("t{:03}-{}-{}-{}", seq, asset.base_name(), target, random_suffix()),
                    asset_index,
                    target: *target,
                    state: TaskState::Pending,
                    result: None,
                    error: None,
                });
                seq += 1;
            }
        }

        Ok(Job {
            id: Uuid::new_v4(),
            assets,
            source,
            targets: unique_targets,
            tasks,
            state: JobState::Created,
            submitted_at: Utc::now(),
        })
    }
}
