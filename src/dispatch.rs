use std::sync::Arc;
use tracing::{info, warn};

use crate::engine::{AssetDescriptor, BatchRequest, BatchResponse, EngineClient};
use crate::job::Job;

/// What came back from one engine submission.
#[derive(Debug, Clone)]
pub enum EngineOutcome {
    /// The engine answered, possibly with partial results.
    Batch(BatchResponse),
    /// The engine was unreachable or failed at the protocol level. The
    /// job's tasks are left untouched so the same job can be resubmitted.
    Transport(String),
}

/// Pure request/response boundary to the engine. Performs no retries and
/// knows nothing about task identity; it only forwards the batch.
pub struct TaskDispatcher {
    engine: Arc<dyn EngineClient>,
}

impl TaskDispatcher {
    pub fn new(engine: Arc<dyn EngineClient>) -> Self {
        Self { engine }
    }

    /// Translate a job into the engine wire request.
    pub fn request_for(job: &Job) -> BatchRequest {
        BatchRequest {
            assets: job
                .assets
                .iter()
                .map(|a| AssetDescriptor {
                    name: a.name.clone(),
                    bytes: a.size_bytes,
                })
                .collect(),
            source_language: job.source.to_string(),
            target_languages: job.targets.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Submit the job as one batch call and fold any failure into a
    /// transport outcome.
    pub async fn submit(&self, job: &Job) -> EngineOutcome {
        let request = Self::request_for(job);
        info!(
            "Dispatching job {}: {} assets x {} languages",
            job.id,
            request.assets.len(),
            request.target_languages.len()
        );

        match self.engine.submit_batch(request).await {
            Ok(batch) => EngineOutcome::Batch(batch),
            Err(e) => {
                warn!("Engine submission failed for job {}: {}", job.id, e);
                EngineOutcome::Transport(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEntry, MockEngineClient};
    use crate::error::BatchdubError;
    use crate::job::{Asset, JobBuilder, MediaKind, TaskState};
    use crate::language::LanguageCode;

    fn sample_job() -> Job {
        JobBuilder::build(
            vec![Asset::new("a.mp4", 2048, MediaKind::Video)],
            LanguageCode::Auto,
            &[LanguageCode::Es, LanguageCode::Fr],
        )
        .unwrap()
    }

    #[test]
    fn test_request_mirrors_job() {
        let job = sample_job();
        let request = TaskDispatcher::request_for(&job);
        assert_eq!(request.assets.len(), 1);
        assert_eq!(request.assets[0].name, "a.mp4");
        assert_eq!(request.assets[0].bytes, 2048);
        assert_eq!(request.source_language, "auto");
        assert_eq!(request.target_languages, vec!["es", "fr"]);
    }

    #[tokio::test]
    async fn test_submit_returns_batch_on_success() {
        let mut engine = MockEngineClient::new();
        engine.expect_submit_batch().times(1).returning(|_| {
            Ok(BatchResponse {
                translated: vec![EngineEntry {
                    original_asset_name: "a.mp4".to_string(),
                    language: "es".to_string(),
                    title: None,
                    media_locator: "https://cdn.example.com/a_es.mp4".to_string(),
                }],
            })
        });

        let dispatcher = TaskDispatcher::new(Arc::new(engine));
        match dispatcher.submit(&sample_job()).await {
            EngineOutcome::Batch(batch) => assert_eq!(batch.translated.len(), 1),
            EngineOutcome::Transport(e) => panic!("unexpected transport outcome: {}", e),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_tasks_untouched() {
        let mut engine = MockEngineClient::new();
        engine
            .expect_submit_batch()
            .times(1)
            .returning(|_| Err(BatchdubError::Transport("connection refused".to_string())));

        let dispatcher = TaskDispatcher::new(Arc::new(engine));
        let job = sample_job();
        let outcome = dispatcher.submit(&job).await;

        assert!(matches!(outcome, EngineOutcome::Transport(_)));
        assert!(job.tasks.iter().all(|t| t.state == TaskState::Pending));
    }
}
