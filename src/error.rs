use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchdubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Engine transport error: {0}")]
    Transport(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Caller errors detected before any engine call. No side effects occur
/// when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no media assets were provided")]
    EmptyAssets,

    #[error("no target languages were provided")]
    EmptyTargets,

    #[error("'auto' is only valid as a source language")]
    AutoTarget,
}

/// Per-task failures. These are absorbed into the aggregated result set
/// and never terminate the job on their own.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskError {
    #[error("engine returned no result for this asset/language pair")]
    MissingResult,
}

pub type Result<T> = std::result::Result<T, BatchdubError>;
