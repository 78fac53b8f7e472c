use serde::Serialize;
use tracing::{debug, warn};

use crate::dispatch::EngineOutcome;
use crate::error::TaskError;
use crate::job::{random_suffix, Job, TaskState};
use crate::language::{resolve_display_name, LanguageCode};

/// A translated media result, produced only from a terminal job.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedAsset {
    pub id: String,
    pub title: String,
    pub original_asset_name: String,
    /// Display name of the target language, falling back to the raw code
    /// when the engine reports something outside the catalog.
    pub language: String,
    pub media_locator: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedTask {
    pub task_id: String,
    pub asset_name: String,
    pub target: LanguageCode,
    pub error: TaskError,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregated {
    pub translated: Vec<TranslatedAsset>,
    pub failed: Vec<FailedTask>,
}

impl Aggregated {
    pub fn any_succeeded(&self) -> bool {
        !self.translated.is_empty()
    }
}

/// Normalize engine output into per-task outcomes. Each engine entry is
/// matched to its task by (original asset name, target code); tasks the
/// engine omitted are failed with `MissingResult` rather than failing the
/// whole batch. A transport outcome leaves every task untouched so the
/// job can be resubmitted as-is.
pub fn aggregate(job: &mut Job, outcome: &EngineOutcome) -> Aggregated {
    let batch = match outcome {
        EngineOutcome::Batch(batch) => batch,
        EngineOutcome::Transport(_) => return Aggregated::default(),
    };

    let mut result = Aggregated::default();

    for entry in &batch.translated {
        let matched = job.tasks.iter_mut().find(|task| {
            task.state == TaskState::Pending
                && job.assets[task.asset_index].name == entry.original_asset_name
                && task.target.as_str() == entry.language
        });

        let Some(task) = matched else {
            warn!(
                "Ignoring engine entry with no matching task: {} -> {}",
                entry.original_asset_name, entry.language
            );
            continue;
        };

        task.state = TaskState::Succeeded;
        task.result = Some(entry.media_locator.clone());

        let asset = &job.assets[task.asset_index];
        let title = entry
            .title
            .clone()
            .unwrap_or_else(|| asset.base_name().to_string());

        result.translated.push(TranslatedAsset {
            // Fresh id per aggregation run; uniqueness matters, determinism
            // does not.
            id: format!("{}-{}-{}", asset.base_name(), entry.language, random_suffix()),
            title,
            original_asset_name: asset.name.clone(),
            language: resolve_display_name(&entry.language),
            media_locator: entry.media_locator.clone(),
        });
    }

    // Everything the engine did not report ends Failed; no task is left
    // without a terminal state.
    for task in &mut job.tasks {
        if !task.state.is_terminal() {
            task.state = TaskState::Failed;
            task.error = Some(TaskError::MissingResult);
            result.failed.push(FailedTask {
                task_id: task.id.clone(),
                asset_name: job.assets[task.asset_index].name.clone(),
                target: task.target,
                error: TaskError::MissingResult,
            });
        }
    }

    debug!(
        "Aggregated job {}: {} succeeded, {} failed",
        job.id,
        result.translated.len(),
        result.failed.len()
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BatchResponse, EngineEntry};
    use crate::job::{Asset, JobBuilder, MediaKind};
    use crate::language::LanguageCode;

    fn job_two_by_two() -> Job {
        JobBuilder::build(
            vec![
                Asset::new("a.mp4", 100, MediaKind::Video),
                Asset::new("b.mp4", 200, MediaKind::Video),
            ],
            LanguageCode::Auto,
            &[LanguageCode::Es, LanguageCode::Fr],
        )
        .unwrap()
    }

    fn entry(name: &str, lang: &str) -> EngineEntry {
        EngineEntry {
            original_asset_name: name.to_string(),
            language: lang.to_string(),
            title: None,
            media_locator: format!("https://cdn.example.com/{}_{}.mp4", name, lang),
        }
    }

    fn batch(entries: Vec<EngineEntry>) -> EngineOutcome {
        EngineOutcome::Batch(BatchResponse {
            translated: entries,
        })
    }

    #[test]
    fn test_full_batch_all_succeed() {
        let mut job = job_two_by_two();
        let outcome = batch(vec![
            entry("a.mp4", "es"),
            entry("a.mp4", "fr"),
            entry("b.mp4", "es"),
            entry("b.mp4", "fr"),
        ]);

        let result = aggregate(&mut job, &outcome);
        assert_eq!(result.translated.len(), 4);
        assert!(result.failed.is_empty());
        assert!(job.all_tasks_terminal());
        assert_eq!(job.succeeded_count(), 4);
    }

    #[test]
    fn test_partial_batch_fails_only_missing_pairs() {
        let mut job = job_two_by_two();
        let outcome = batch(vec![
            entry("a.mp4", "es"),
            entry("a.mp4", "fr"),
            entry("b.mp4", "es"),
        ]);

        let result = aggregate(&mut job, &outcome);
        assert_eq!(result.translated.len(), 3);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].asset_name, "b.mp4");
        assert_eq!(result.failed[0].target, LanguageCode::Fr);
        assert_eq!(result.failed[0].error, TaskError::MissingResult);
        assert!(result.any_succeeded());
        assert!(job.all_tasks_terminal());
    }

    #[test]
    fn test_empty_batch_fails_every_task() {
        let mut job = job_two_by_two();
        let result = aggregate(&mut job, &batch(vec![]));
        assert!(result.translated.is_empty());
        assert_eq!(result.failed.len(), 4);
        assert!(!result.any_succeeded());
        assert_eq!(job.failed_count(), 4);
    }

    #[test]
    fn test_transport_outcome_leaves_tasks_untouched() {
        let mut job = job_two_by_two();
        let result = aggregate(
            &mut job,
            &EngineOutcome::Transport("connection refused".to_string()),
        );
        assert!(result.translated.is_empty());
        assert!(result.failed.is_empty());
        assert!(!job.all_tasks_terminal());
    }

    #[test]
    fn test_extra_engine_entries_ignored() {
        let mut job = job_two_by_two();
        let outcome = batch(vec![
            entry("a.mp4", "es"),
            entry("a.mp4", "fr"),
            entry("b.mp4", "es"),
            entry("b.mp4", "fr"),
            entry("ghost.mp4", "es"),
            entry("a.mp4", "ja"),
        ]);

        let result = aggregate(&mut job, &outcome);
        assert_eq!(result.translated.len(), 4);
        assert!(result.failed.is_empty());
    }

    #[test]
    fn test_title_defaults_to_base_filename() {
        let mut job = job_two_by_two();
        let mut titled = entry("a.mp4", "es");
        titled.title = Some("A Spanish Cut".to_string());
        let outcome = batch(vec![titled, entry("a.mp4", "fr")]);

        let result = aggregate(&mut job, &outcome);
        assert_eq!(result.translated[0].title, "A Spanish Cut");
        assert_eq!(result.translated[1].title, "a");
    }

    #[test]
    fn test_language_display_name_with_fallback() {
        let mut job = JobBuilder::build(
            vec![Asset::new("a.mp4", 100, MediaKind::Video)],
            LanguageCode::Auto,
            &[LanguageCode::Es],
        )
        .unwrap();

        // The engine answers with a code outside the catalog; the raw code
        // is kept as the display name and the entry is simply unmatched.
        let outcome = batch(vec![entry("a.mp4", "es"), entry("a.mp4", "xx")]);
        let result = aggregate(&mut job, &outcome);
        assert_eq!(result.translated.len(), 1);
        assert_eq!(result.translated[0].language, "Spanish");
        assert_eq!(resolve_display_name("xx"), "xx");
    }

    #[test]
    fn test_ids_unique_across_repeated_runs() {
        let mut first = job_two_by_two();
        let mut second = job_two_by_two();
        let outcome = batch(vec![entry("a.mp4", "es")]);

        let id_one = aggregate(&mut first, &outcome).translated[0].id.clone();
        let id_two = aggregate(&mut second, &outcome).translated[0].id.clone();
        assert_ne!(id_one, id_two);
        assert!(id_one.starts_with("a-es-"));
    }
}
