//! Conversation state: sealed turns plus the single in-flight turn.
//!
//! The store is the authoritative state the rest of the system observes.
//! It exclusively owns the turn sequence; the orchestrator mutates the
//! in-flight turn only through its `TurnChannel`, and sealed turns are
//! immutable and inert.

use tracing::debug;
use uuid::Uuid;

use lantern_core::types::{ConversationSnapshot, HistoryEntry, Turn};

use crate::channel::TurnChannel;
use crate::error::EngineError;

/// Ordered sequence of sealed turns plus at most one in-flight turn.
///
/// The "at most one" invariant is structural: the in-flight slot is an
/// `Option`, and `begin_turn` refuses to overwrite an occupied slot.
#[derive(Debug, Default)]
pub struct ConversationStore {
    sealed: Vec<Turn>,
    in_flight: Option<TurnChannel>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new in-flight turn.
    ///
    /// The caller must have sealed or discarded any prior turn first.
    pub fn begin_turn(&mut self, channel: TurnChannel) -> Result<(), EngineError> {
        if self.in_flight.is_some() {
            return Err(EngineError::TurnAlreadyInFlight);
        }
        self.in_flight = Some(channel);
        Ok(())
    }

    pub fn in_flight(&self) -> Option<&TurnChannel> {
        self.in_flight.as_ref()
    }

    pub fn in_flight_mut(&mut self) -> Option<&mut TurnChannel> {
        self.in_flight.as_mut()
    }

    /// Freeze the in-flight turn at its current state and append it to the
    /// sealed sequence. A no-op when nothing is in flight.
    ///
    /// Sealing does not require a terminal status: a fast follow-up seals
    /// the prior turn while it is still `Streaming`, freezing whatever
    /// answer text had arrived.
    pub fn seal_in_flight(&mut self) -> Option<Uuid> {
        let channel = self.in_flight.take()?;
        let turn = channel.freeze();
        let id = turn.id;
        debug!(turn_id = %id, status = ?turn.status, "Sealing turn into history");
        self.sealed.push(turn);
        Some(id)
    }

    /// Discard the in-flight turn and all sealed history.
    ///
    /// This is the deliberate non-follow-up reset, not a seal.
    pub fn reset(&mut self) {
        if !self.sealed.is_empty() || self.in_flight.is_some() {
            debug!(
                sealed = self.sealed.len(),
                had_in_flight = self.in_flight.is_some(),
                "Resetting conversation"
            );
        }
        self.sealed.clear();
        self.in_flight = None;
    }

    pub fn sealed(&self) -> &[Turn] {
        &self.sealed
    }

    /// Sealed plus in-flight turn count.
    pub fn len(&self) -> usize {
        self.sealed.len() + usize::from(self.in_flight.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pure projection of sealed turns into backend context, oldest first.
    ///
    /// Only sealed turns contribute; the in-flight turn never does. At most
    /// the `max_turns` most recent entries are kept.
    pub fn project_history(&self, max_turns: usize) -> Vec<HistoryEntry> {
        let skip = self.sealed.len().saturating_sub(max_turns);
        self.sealed
            .iter()
            .skip(skip)
            .map(Turn::history_entry)
            .collect()
    }

    /// Render-ready view: sealed turns in order, then the in-flight turn.
    pub fn snapshot(&self) -> ConversationSnapshot {
        let mut turns = self.sealed.clone();
        if let Some(channel) = &self.in_flight {
            turns.push(channel.turn().clone());
        }
        ConversationSnapshot { turns }
    }
}

// =============================================================================
// Tests
// =============================================================================
