use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{BatchRequest, BatchResponse, EngineClient};
use crate::config::EngineConfig;
use crate::error::{BatchdubError, Result};

/// HTTP implementation of the engine client. One synchronous POST per
/// batch; long-poll or webhook transports would live behind the same
/// trait.
pub struct HttpEngineClient {
    client: Client,
    config: EngineConfig,
}

impl HttpEngineClient {
    pub fn new(config: EngineConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, config }
    }

    fn batch_url(&self) -> String {
        format!("{}/v1/translate/batch", self.config.endpoint)
    }
}

#[async_trait]
impl EngineClient for HttpEngineClient {
    async fn submit_batch(&self, request: BatchRequest) -> Result<BatchResponse> {
        let url = self.batch_url();
        debug!("Sending batch translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BatchdubError::Transport(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BatchdubError::Engine(format!(
                "Engine API error {}: {}",
                status, error_text
            )));
        }

        let batch: BatchResponse = response
            .json()
            .await
            .map_err(|e| BatchdubError::Engine(format!("Failed to parse response: {}", e)))?;

        debug!(
            "Engine returned {} translated entries",
            batch.translated.len()
        );

        Ok(batch)
    }
}
