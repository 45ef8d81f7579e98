//! Shared push-channel wrapper.
//!
//! One bidirectional connection serves the whole conversation; individual
//! turns attach and detach listeners against it instead of opening their
//! own. The listener registry is a single slot keyed by turn identity:
//! attaching always detaches the previous listener first, so there is no
//! window in which two turns both receive tokens.

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use lantern_core::wire::{StreamEvent, StreamRequest};

use crate::error::EngineError;

/// Outbound half of the push channel.
///
/// Implementations serialize a [`StreamRequest`] onto the shared
/// connection. The inbound half is delivered to [`PushTransport::route`]
/// by whoever owns the connection's read side.
#[async_trait]
pub trait PushConnection: Send {
    /// Emit a generation request on the shared channel.
    async fn send(&mut self, request: &StreamRequest) -> Result<(), EngineError>;

    /// Close the connection on conversation teardown.
    async fn close(&mut self);
}

/// Multiplexes the single shared connection across turns.
pub struct PushTransport {
    connection: Option<Box<dyn PushConnection>>,
    /// The one turn currently allowed to receive stream events.
    active: Option<Uuid>,
    /// Events that arrived with no active listener (late or duplicate
    /// delivery after a terminal event).
    dropped_events: u64,
}

impl PushTransport {
    /// Create a transport with no connection yet.
    pub fn new() -> Self {
        Self {
            connection: None,
            active: None,
            dropped_events: 0,
        }
    }

    /// Install the shared connection. Called once per conversation lifetime.
    pub fn connect(&mut self, connection: Box<dyn PushConnection>) {
        info!("Push channel connected");
        self.connection = Some(connection);
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Close and drop the connection; any active listener is detached.
    pub async fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
            info!("Push channel closed");
        }
        self.active = None;
    }

    /// Make `turn_id` the sole listener target.
    ///
    /// The previous listener, if any, is detached first; its remaining
    /// events will be dropped by [`PushTransport::route`].
    pub fn attach(&mut self, turn_id: Uuid) {
        if let Some(previous) = self.active.replace(turn_id) {
            debug!(%previous, new = %turn_id, "Detached previous stream listener");
        }
    }

    /// Remove `turn_id` as the listener target. Idempotent; a stale id
    /// (already replaced by a newer attach) is ignored.
    pub fn detach(&mut self, turn_id: Uuid) {
        if self.active == Some(turn_id) {
            self.active = None;
        }
    }

    /// Detach whatever listener is active.
    pub fn detach_all(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<Uuid> {
        self.active
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Emit a generation request on the shared connection.
    ///
    /// Submitting before the channel is connected is a deterministic
    /// precondition failure, never a silent drop.
    pub async fn request_stream(&mut self, request: &StreamRequest) -> Result<(), EngineError> {
        match self.connection.as_mut() {
            Some(connection) => connection.send(request).await,
            None => Err(EngineError::NotConnected),
        }
    }

    /// Route one inbound event to the active listener.
    ///
    /// Returns the turn the event belongs to, or `None` when no listener
    /// is attached; unroutable events are counted and logged, not applied.
    pub fn route(&mut self, event: &StreamEvent) -> Option<Uuid> {
        match self.active {
            Some(turn_id) => Some(turn_id),
            None => {
                self.dropped_events += 1;
                debug!(
                    event = event.event_name(),
                    dropped = self.dropped_events,
                    "Dropping stream event with no active listener"
                );
                None
            }
        }
    }
}

impl Default for PushTransport {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
