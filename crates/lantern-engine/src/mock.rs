//! Test doubles for the engine's network seams.
//!
//! Used by the engine's own tests and by downstream crates that drive the
//! orchestrator without a real backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lantern_core::types::SourceSet;
use lantern_core::wire::StreamRequest;

use crate::error::EngineError;
use crate::orchestrator::SourceFetcher;
use crate::transport::PushConnection;

/// Shared record of requests a [`MockConnection`] has sent.
pub type SentRequests = Arc<Mutex<Vec<StreamRequest>>>;

/// In-memory [`PushConnection`] that records outbound requests.
pub struct MockConnection {
    sent: SentRequests,
    fail_with: Option<String>,
    closed: bool,
}

impl MockConnection {
    /// A connection that accepts every request, plus a handle to inspect
    /// what was sent.
    pub fn new() -> (Self, SentRequests) {
        let sent: SentRequests = Arc::default();
        (
            Self {
                sent: Arc::clone(&sent),
                fail_with: None,
                closed: false,
            },
            sent,
        )
    }

    /// A connection whose every send fails with `message`.
    pub fn failing(message: impl Into<String>) -> (Self, SentRequests) {
        let (mut connection, sent) = Self::new();
        connection.fail_with = Some(message.into());
        (connection, sent)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl PushConnection for MockConnection {
    async fn send(&mut self, request: &StreamRequest) -> Result<(), EngineError> {
        if let Some(message) = &self.fail_with {
            return Err(EngineError::Transport(message.clone()));
        }
        self.sent
            .lock()
            .map_err(|e| EngineError::Transport(format!("sent-requests lock poisoned: {}", e)))?
            .push(request.clone());
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// [`SourceFetcher`] that returns a fixed result for every query.
pub struct StaticSourceFetcher {
    result: Result<SourceSet, String>,
}

impl StaticSourceFetcher {
    /// Always succeed with `sources`.
    pub fn with_sources(sources: SourceSet) -> Self {
        Self {
            result: Ok(sources),
        }
    }

    /// Always succeed with an empty source set.
    pub fn empty() -> Self {
        Self::with_sources(SourceSet::default())
    }

    /// Always fail with `message` (e.g. `"503 Service Unavailable"`).
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
        }
    }
}

#[async_trait]
impl SourceFetcher for StaticSourceFetcher {
    async fn fetch(&self, _query: &str) -> Result<SourceSet, EngineError> {
        match &self.result {
            Ok(sources) => Ok(sources.clone()),
            Err(message) => Err(EngineError::SourceFetch(message.clone())),
        }
    }
}
