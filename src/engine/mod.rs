// Engine client abstraction
//
// The translation engine is a remote, opaque service that performs the
// actual transcription, translation, voice synthesis and muxing. This
// module is the single seam to it: one request/response operation behind
// a trait, so tests can substitute a double for the whole engine.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpEngineClient;

use crate::config::EngineConfig;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub name: String,
    pub bytes: u64,
}

/// One batch call covers the full asset x language cross-product; the
/// engine manages intra-batch parallelism on its side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub assets: Vec<AssetDescriptor>,
    pub source_language: String,
    pub target_languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEntry {
    pub original_asset_name: String,
    pub language: String,
    #[serde(default)]
    pub title: Option<String>,
    pub media_locator: String,
}

/// Engine success payload. May contain fewer entries than the requested
/// cross-product; missing pairs are handled downstream by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub translated: Vec<EngineEntry>,
}

/// Main trait for engine operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Submit a batch translation request and wait for its outcome
    async fn submit_batch(&self, request: BatchRequest) -> Result<BatchResponse>;
}

/// Factory for creating engine client instances
pub struct EngineClientFactory;

impl EngineClientFactory {
    /// Create the default engine client implementation (HTTP-based)
    pub fn create_default(config: EngineConfig) -> Box<dyn EngineClient> {
        Box::new(http::HttpEngineClient::new(config))
    }
}
