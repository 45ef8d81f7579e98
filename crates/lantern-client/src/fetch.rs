//! HTTP source fetcher.
//!
//! One POST per turn against the ranking endpoint. Non-success responses
//! surface as `"<statusCode> <statusText>"` so the failure a turn records
//! reads exactly like the server's status line.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use lantern_core::config::SearchConfig;
use lantern_core::types::SourceSet;
use lantern_core::wire::SourceFetchRequest;
use lantern_engine::{EngineError, SourceFetcher};

use crate::error::Result;

pub struct HttpSourceFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSourceFetcher {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, query: &str) -> std::result::Result<SourceSet, EngineError> {
        let request = SourceFetchRequest {
            query: query.to_string(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| EngineError::SourceFetch(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown Error");
            return Err(EngineError::SourceFetch(format!(
                "{} {}",
                status.as_u16(),
                reason
            )));
        }

        let sources: SourceSet = response
            .json()
            .await
            .map_err(|err| EngineError::SourceFetch(err.to_string()))?;
        debug!(
            search = sources.search_results.len(),
            video = sources.video_results.len(),
            "Sources fetched"
        );
        Ok(sources)
    }
}
