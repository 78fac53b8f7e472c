//! Batchdub - Batch Media Translation Orchestration
//!
//! This is the main entry point for the batchdub CLI, the reference
//! collaborator of the job controller: it gathers media assets, submits
//! one translation job to the engine, renders synthesized progress, and
//! prints the aggregated result set.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkdir::WalkDir;

use batchdub::cli::{Args, Commands};
use batchdub::config::Config;
use batchdub::controller::{JobController, JobPhase};
use batchdub::dispatch::TaskDispatcher;
use batchdub::engine::EngineClientFactory;
use batchdub::error::BatchdubError;
use batchdub::job::{Asset, MediaKind};
use batchdub::language::{parse_target_list, LanguageCode};

const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];
const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "aac", "flac", "ogg", "m4a"];

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Translate {
            inputs,
            source_lang,
            target_langs,
        } => {
            let assets = collect_assets(&inputs)?;
            run_translation(&config, assets, &source_lang, &target_langs).await?;
        }
        Commands::Batch {
            input_dir,
            source_lang,
            target_langs,
        } => {
            info!("Scanning directory: {}", input_dir.display());
            let files = scan_directory(&input_dir)?;
            if files.is_empty() {
                println!("No media files found in {}", input_dir.display());
                return Ok(());
            }
            info!("Found {} media files to translate", files.len());
            let assets = collect_assets(&files)?;
            run_translation(&config, assets, &source_lang, &target_langs).await?;
        }
        Commands::Languages => {
            println!("\nSupported Languages:");
            println!("{:<8} {:<20} {:<10}", "Code", "Name", "Role");
            println!("{}", "-".repeat(40));
            println!(
                "{:<8} {:<20} {:<10}",
                LanguageCode::Auto,
                LanguageCode::Auto.display_name(),
                "source"
            );
            for code in LanguageCode::targets() {
                println!(
                    "{:<8} {:<20} {:<10}",
                    code,
                    code.display_name(),
                    "source/target"
                );
            }
        }
        Commands::Init { path } => {
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Drive a full job lifecycle: submit, render synthesized progress until
/// the job settles, then print the aggregated result set.
async fn run_translation(
    config: &Config,
    assets: Vec<Asset>,
    source_lang: &str,
    target_langs: &str,
) -> Result<()> {
    let source: LanguageCode = source_lang.parse()?;
    let targets = parse_target_list(target_langs)?;

    info!(
        "Translating {} assets to {} languages",
        assets.len(),
        targets.len()
    );

    let engine = EngineClientFactory::create_default(config.engine.clone());
    let dispatcher = TaskDispatcher::new(Arc::from(engine));
    let controller = JobController::new(dispatcher, config.progress.clone());

    let handle = controller
        .request_translation(assets, source, &targets)
        .map_err(BatchdubError::Validation)?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("progress bar template should be valid")
            .progress_chars("=> "),
    );

    let mut progress_rx = controller
        .subscribe_progress(&handle)
        .ok_or_else(|| BatchdubError::Engine("job was discarded before it started".to_string()))?;
    let mut phase_rx = controller.subscribe_phase();

    loop {
        tokio::select! {
            changed = progress_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = progress_rx.borrow().clone();
                bar.set_position((snapshot.fraction_complete * 100.0).round() as u64);
                bar.set_message(format!(
                    "{} [{}]",
                    snapshot.status_label,
                    snapshot.elapsed_display()
                ));
            }
            _ = phase_rx.wait_for(|p| p.is_terminal()) => break,
        }
    }

    let phase = controller.phase();
    if let Some(snapshot) = controller.snapshot(&handle) {
        bar.set_position((snapshot.fraction_complete * 100.0).round() as u64);
        bar.finish_with_message(snapshot.status_label.to_string());
    } else {
        bar.abandon();
    }

    match phase {
        JobPhase::Completed => {
            let results = controller.results(&handle).unwrap_or_default();
            let failed = controller.failed_tasks(&handle);

            println!("\nTranslated Assets:");
            println!("{:<30} {:<15} {:<50}", "Title", "Language", "Location");
            println!("{}", "-".repeat(95));
            for asset in &results {
                println!(
                    "{:<30} {:<15} {:<50}",
                    asset.title, asset.language, asset.media_locator
                );
            }

            println!(
                "\nSummary: {} tasks, {} succeeded, {} failed",
                handle.task_count,
                results.len(),
                failed.len()
            );

            for task in &failed {
                warn!(
                    "No result for {} -> {}: {}",
                    task.asset_name, task.target, task.error
                );
            }

            Ok(())
        }
        JobPhase::Failed => {
            let error = controller
                .error(&handle)
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown failure".to_string());
            Err(anyhow::anyhow!("Translation job failed: {}", error))
        }
        other => Err(anyhow::anyhow!(
            "Translation job ended in unexpected state: {:?}",
            other
        )),
    }
}

/// Build assets from explicit file paths. Size comes from file metadata;
/// the media kind from the file extension.
fn collect_assets(paths: &[PathBuf]) -> Result<Vec<Asset>> {
    let mut assets = Vec::with_capacity(paths.len());
    for path in paths {
        if !path.exists() {
            return Err(BatchdubError::FileNotFound(path.display().to_string()).into());
        }
        let kind = media_kind(path)
            .ok_or_else(|| BatchdubError::UnsupportedFormat(path.display().to_string()))?;
        let size_bytes = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .ok_or_else(|| BatchdubError::Config(format!("Invalid filename: {}", path.display())))?
            .to_string_lossy()
            .to_string();
        assets.push(Asset::new(name, size_bytes, kind));
    }
    Ok(assets)
}

/// Find media files under a directory, recursively.
fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BatchdubError::Config("Input path is not a directory".to_string()).into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if media_kind(entry.path()).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn media_kind(path: &Path) -> Option<MediaKind> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let batchdub_dir = std::env::current_dir()?.join(".batchdub");
    let log_dir = batchdub_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "batchdub.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
