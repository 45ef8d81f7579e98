//! Stream orchestrator: drives turn channels to completion.
//!
//! Sequences the two-phase request per turn (synchronous source lookup,
//! then asynchronous token streaming), decides when a turn is committed
//! into the conversation store, and builds the history payload sent to
//! the backend for follow-up context.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use async_trait::async_trait;

use lantern_core::config::LanternConfig;
use lantern_core::types::{ConversationSnapshot, SourceSet, TurnStatus};
use lantern_core::wire::{StreamEvent, StreamRequest};

use crate::channel::TurnChannel;
use crate::error::EngineError;
use crate::store::ConversationStore;
use crate::transport::{PushConnection, PushTransport};

/// The source-ranking collaborator (request/response, one call per turn).
///
/// A failed fetch reports `EngineError::SourceFetch` carrying the
/// transport's error text verbatim (`"<statusCode> <statusText>"` for HTTP).
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<SourceSet, EngineError>;
}

/// Central coordinator for the streaming conversation.
///
/// Owns the conversation store and the shared push transport. All state
/// transitions happen on the caller's single task in response to completed
/// calls or routed events; observers see a fresh [`ConversationSnapshot`]
/// after every transition.
pub struct StreamOrchestrator {
    fetcher: Box<dyn SourceFetcher>,
    transport: PushTransport,
    store: ConversationStore,
    max_query_length: usize,
    max_history_turns: usize,
    stall_timeout: Duration,
    /// When the in-flight turn last heard from the stream.
    last_event_at: Option<Instant>,
    snapshot_tx: watch::Sender<ConversationSnapshot>,
}

impl StreamOrchestrator {
    /// Create an orchestrator with no push connection yet.
    pub fn new(config: &LanternConfig, fetcher: Box<dyn SourceFetcher>) -> Self {
        let (snapshot_tx, _) = watch::channel(ConversationSnapshot::default());
        Self {
            fetcher,
            transport: PushTransport::new(),
            store: ConversationStore::new(),
            max_query_length: config.stream.max_query_length,
            max_history_turns: config.conversation.max_history_turns,
            stall_timeout: Duration::from_secs(config.stream.stall_timeout_secs),
            last_event_at: None,
            snapshot_tx,
        }
    }

    /// Install the shared push connection for this conversation.
    pub fn connect(&mut self, connection: Box<dyn PushConnection>) {
        self.transport.connect(connection);
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Tear down the conversation's push channel.
    pub async fn close(&mut self) {
        self.transport.close().await;
    }

    /// Subscribe to render-ready snapshots, updated on every transition.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current render-ready view of the conversation.
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.store.snapshot()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn transport(&self) -> &PushTransport {
        &self.transport
    }

    /// Submit a query and start its turn.
    ///
    /// With `is_follow_up = false` the whole conversation is discarded and
    /// restarted. With `is_follow_up = true` the prior turn (if any) is
    /// sealed at its current state first, even mid-stream; its frozen
    /// partial answer then rides along in the outbound history. In both
    /// cases the previous turn's listener is detached before the new turn
    /// attaches, so an abandoned stream can never leak tokens into the
    /// new turn.
    ///
    /// Returns `Err` only for precondition failures (empty/oversized query,
    /// channel not connected), which leave the conversation untouched.
    /// Collaborator failures mark the turn `Failed` and return `Ok`.
    pub async fn submit(&mut self, query: &str, is_follow_up: bool) -> Result<(), EngineError> {
        if query.is_empty() {
            return Err(EngineError::EmptyQuery);
        }
        if query.len() > self.max_query_length {
            return Err(EngineError::QueryTooLong(self.max_query_length));
        }
        if !self.transport.is_connected() {
            return Err(EngineError::NotConnected);
        }

        // Cancel the prior stream before any state changes: remaining
        // tokens for an abandoned turn are dropped at the transport.
        self.transport.detach_all();

        if is_follow_up {
            self.store.seal_in_flight();
        } else {
            self.store.reset();
        }

        let mut channel = TurnChannel::new(query);
        let turn_id = channel.id();
        channel.begin_fetch()?;
        self.store.begin_turn(channel)?;
        info!(%turn_id, is_follow_up, "Turn submitted");
        self.publish();

        // Phase 1: synchronous source lookup.
        let fetched = self.fetcher.fetch(query).await;
        match fetched {
            Ok(sources) => {
                if let Some(channel) = self.store.in_flight_mut() {
                    channel.sources_loaded(sources)?;
                }
            }
            Err(err) => {
                let message = match err {
                    EngineError::SourceFetch(message) => message,
                    other => other.to_string(),
                };
                warn!(%turn_id, error = %message, "Source fetch failed");
                self.fail_fetch(message);
                return Ok(());
            }
        }

        // Phase 2: attach the listener, then request generation with the
        // sealed-history projection frozen at this moment.
        let history = self.store.project_history(self.max_history_turns);
        self.transport.attach(turn_id);
        let request = StreamRequest {
            query: query.to_string(),
            history,
        };
        let requested = self.transport.request_stream(&request).await;
        if let Err(err) = requested {
            warn!(%turn_id, error = %err, "Stream request failed");
            self.transport.detach(turn_id);
            self.fail_stream(err.to_string());
            return Ok(());
        }

        self.last_event_at = Some(Instant::now());
        self.publish();
        Ok(())
    }

    /// Apply one inbound stream event.
    ///
    /// Events are routed through the transport's listener registry; events
    /// for a detached turn are dropped there. Tokens append in strict
    /// arrival order; terminal events close the channel and commit the
    /// turn into the store.
    pub fn handle_event(&mut self, event: StreamEvent) {
        let Some(turn_id) = self.transport.route(&event) else {
            return;
        };
        let Some(channel) = self.store.in_flight_mut() else {
            debug!(%turn_id, event = event.event_name(), "Routed event has no in-flight turn");
            return;
        };
        if channel.id() != turn_id {
            debug!(%turn_id, in_flight = %channel.id(), "Routed event targets a different turn");
            return;
        }

        self.last_event_at = Some(Instant::now());
        match event {
            StreamEvent::Token { data } => channel.append_token(&data),
            StreamEvent::StreamEnd => {
                if let Err(err) = channel.stream_ended() {
                    warn!(%turn_id, error = %err, "Ignoring stream_end in unexpected state");
                }
                self.transport.detach(turn_id);
                self.store.seal_in_flight();
                info!(%turn_id, "Turn complete");
            }
            StreamEvent::StreamError { error } => {
                warn!(%turn_id, error = %error, "Stream failed");
                if let Err(err) = channel.stream_failed(&error) {
                    warn!(%turn_id, error = %err, "Ignoring stream_error in unexpected state");
                }
                self.transport.detach(turn_id);
                self.store.seal_in_flight();
            }
        }
        self.publish();
    }

    /// Dead-man timer: fail the in-flight turn if the stream has been
    /// silent longer than the configured stall timeout.
    ///
    /// Call periodically (e.g. from an interval tick). Returns `true`
    /// when a turn was failed.
    pub fn tick_stall(&mut self) -> bool {
        let Some(channel) = self.store.in_flight() else {
            return false;
        };
        let turn_id = channel.id();
        if !matches!(
            channel.status(),
            TurnStatus::AwaitingStream | TurnStatus::Streaming
        ) {
            return false;
        }
        let Some(last) = self.last_event_at else {
            return false;
        };
        if last.elapsed() < self.stall_timeout {
            return false;
        }

        let message = format!(
            "stream stalled: no event for {}s",
            self.stall_timeout.as_secs()
        );
        warn!(%turn_id, "{}", message);
        self.transport.detach(turn_id);
        self.fail_stream(message);
        true
    }

    fn fail_fetch(&mut self, message: String) {
        if let Some(channel) = self.store.in_flight_mut() {
            if let Err(err) = channel.fetch_failed(message) {
                warn!(error = %err, "Could not fail turn after fetch error");
            }
        }
        self.store.seal_in_flight();
        self.publish();
    }

    fn fail_stream(&mut self, message: String) {
        if let Some(channel) = self.store.in_flight_mut() {
            if let Err(err) = channel.stream_failed(message) {
                warn!(error = %err, "Could not fail turn after stream error");
            }
        }
        self.store.seal_in_flight();
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.store.snapshot());
    }
}

// =============================================================================
// Tests
// =============================================================================
