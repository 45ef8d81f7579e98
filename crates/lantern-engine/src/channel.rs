//! Turn state machine with validated transitions.
//!
//! A `TurnChannel` owns one turn's lifecycle: the source-fetch phase, the
//! token stream, and the terminal seal. Allowed transitions:
//! Pending -> SourcesLoading -> AwaitingStream -> Streaming -> Complete,
//! with Failed reachable from SourcesLoading, AwaitingStream, and Streaming.

use tracing::debug;
use uuid::Uuid;

use lantern_core::types::{SourceSet, Turn, TurnStatus};

use crate::error::EngineError;

/// Validate that a status transition is allowed.
///
/// Valid transitions:
/// - Pending -> SourcesLoading
/// - SourcesLoading -> AwaitingStream
/// - SourcesLoading -> Failed
/// - AwaitingStream -> Streaming
/// - AwaitingStream -> Complete (stream ended before any token)
/// - AwaitingStream -> Failed
/// - Streaming -> Complete
/// - Streaming -> Failed
pub fn validate_transition(from: TurnStatus, to: TurnStatus) -> Result<(), EngineError> {
    let valid = matches!(
        (from, to),
        (TurnStatus::Pending, TurnStatus::SourcesLoading)
            | (TurnStatus::SourcesLoading, TurnStatus::AwaitingStream)
            | (TurnStatus::SourcesLoading, TurnStatus::Failed)
            | (TurnStatus::AwaitingStream, TurnStatus::Streaming)
            | (TurnStatus::AwaitingStream, TurnStatus::Complete)
            | (TurnStatus::AwaitingStream, TurnStatus::Failed)
            | (TurnStatus::Streaming, TurnStatus::Complete)
            | (TurnStatus::Streaming, TurnStatus::Failed)
    );

    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition(from, to))
    }
}

/// One logical request/stream pairing for a single query.
///
/// Wraps the turn so that its status can only change through validated
/// transitions and its answer only grows through [`TurnChannel::append_token`].
#[derive(Debug)]
pub struct TurnChannel {
    turn: Turn,
}

impl TurnChannel {
    /// Create a channel holding a fresh `Pending` turn.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            turn: Turn::new(query),
        }
    }

    /// Turn identity, used to key the transport's listener registry.
    pub fn id(&self) -> Uuid {
        self.turn.id
    }

    pub fn status(&self) -> TurnStatus {
        self.turn.status
    }

    pub fn turn(&self) -> &Turn {
        &self.turn
    }

    /// Enter the source-fetch phase.
    pub fn begin_fetch(&mut self) -> Result<(), EngineError> {
        self.transition(TurnStatus::SourcesLoading)
    }

    /// Record the atomically-fetched source set and await the stream.
    pub fn sources_loaded(&mut self, sources: SourceSet) -> Result<(), EngineError> {
        self.transition(TurnStatus::AwaitingStream)?;
        self.turn.sources = sources;
        Ok(())
    }

    /// Fail the turn during the source-fetch phase.
    ///
    /// `message` is the transport's error text, stored verbatim.
    pub fn fetch_failed(&mut self, message: impl Into<String>) -> Result<(), EngineError> {
        validate_transition(self.turn.status, TurnStatus::Failed)?;
        self.fail(message.into());
        Ok(())
    }

    /// Append one token chunk in strict arrival order.
    ///
    /// The first token moves the turn from `AwaitingStream` to `Streaming`.
    /// Tokens arriving outside those two states (late or duplicate delivery
    /// after a terminal event) are logged and dropped, never applied.
    pub fn append_token(&mut self, text: &str) {
        match self.turn.status {
            TurnStatus::AwaitingStream => {
                self.turn.status = TurnStatus::Streaming;
                self.turn.answer.push_str(text);
            }
            TurnStatus::Streaming => self.turn.answer.push_str(text),
            status => {
                debug!(
                    turn_id = %self.turn.id,
                    ?status,
                    chunk_len = text.len(),
                    "Dropping token outside streaming states"
                );
            }
        }
    }

    /// Terminal success: the answer is complete.
    pub fn stream_ended(&mut self) -> Result<(), EngineError> {
        self.transition(TurnStatus::Complete)
    }

    /// Terminal failure after generation was requested.
    ///
    /// The partial answer accumulated so far is retained, not discarded.
    pub fn stream_failed(&mut self, message: impl Into<String>) -> Result<(), EngineError> {
        let status = self.turn.status;
        if !matches!(
            status,
            TurnStatus::AwaitingStream | TurnStatus::Streaming
        ) {
            return Err(EngineError::InvalidTransition(status, TurnStatus::Failed));
        }
        self.fail(message.into());
        Ok(())
    }

    /// Freeze the turn at its current state and give up ownership.
    ///
    /// Used when sealing into the conversation history; a fast follow-up
    /// freezes a still-`Streaming` turn with whatever answer has arrived.
    pub fn freeze(self) -> Turn {
        self.turn
    }

    fn transition(&mut self, to: TurnStatus) -> Result<(), EngineError> {
        validate_transition(self.turn.status, to)?;
        self.turn.status = to;
        Ok(())
    }

    fn fail(&mut self, message: String) {
        self.turn.status = TurnStatus::Failed;
        self.turn.error = Some(message);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming_channel() -> TurnChannel {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        channel.sources_loaded(SourceSet::default()).unwrap();
        channel.append_token("Hel");
        channel
    }

    // =====================================================================
    // Valid transitions
    // =====================================================================

    #[test]
    fn test_pending_to_sources_loading() {
        assert!(validate_transition(TurnStatus::Pending, TurnStatus::SourcesLoading).is_ok());
    }

    #[test]
    fn test_sources_loading_to_awaiting_stream() {
        assert!(
            validate_transition(TurnStatus::SourcesLoading, TurnStatus::AwaitingStream).is_ok()
        );
    }

    #[test]
    fn test_sources_loading_to_failed() {
        assert!(validate_transition(TurnStatus::SourcesLoading, TurnStatus::Failed).is_ok());
    }

    #[test]
    fn test_awaiting_stream_to_streaming() {
        assert!(validate_transition(TurnStatus::AwaitingStream, TurnStatus::Streaming).is_ok());
    }

    #[test]
    fn test_awaiting_stream_to_complete() {
        assert!(validate_transition(TurnStatus::AwaitingStream, TurnStatus::Complete).is_ok());
    }

    #[test]
    fn test_streaming_to_complete() {
        assert!(validate_transition(TurnStatus::Streaming, TurnStatus::Complete).is_ok());
    }

    #[test]
    fn test_streaming_to_failed() {
        assert!(validate_transition(TurnStatus::Streaming, TurnStatus::Failed).is_ok());
    }

    // =====================================================================
    // Invalid transitions
    // =====================================================================

    #[test]
    fn test_pending_to_streaming_invalid() {
        assert!(validate_transition(TurnStatus::Pending, TurnStatus::Streaming).is_err());
    }

    #[test]
    fn test_pending_to_failed_invalid() {
        // Failure requires a request to have been issued first.
        assert!(validate_transition(TurnStatus::Pending, TurnStatus::Failed).is_err());
    }

    #[test]
    fn test_sources_loading_to_streaming_invalid() {
        assert!(validate_transition(TurnStatus::SourcesLoading, TurnStatus::Streaming).is_err());
    }

    #[test]
    fn test_complete_to_anything_invalid() {
        assert!(validate_transition(TurnStatus::Complete, TurnStatus::Streaming).is_err());
        assert!(validate_transition(TurnStatus::Complete, TurnStatus::Failed).is_err());
        assert!(validate_transition(TurnStatus::Complete, TurnStatus::Pending).is_err());
    }

    #[test]
    fn test_failed_to_anything_invalid() {
        assert!(validate_transition(TurnStatus::Failed, TurnStatus::Streaming).is_err());
        assert!(validate_transition(TurnStatus::Failed, TurnStatus::Complete).is_err());
        assert!(validate_transition(TurnStatus::Failed, TurnStatus::Pending).is_err());
    }

    #[test]
    fn test_self_transitions_invalid() {
        for status in [
            TurnStatus::Pending,
            TurnStatus::SourcesLoading,
            TurnStatus::AwaitingStream,
            TurnStatus::Streaming,
            TurnStatus::Complete,
            TurnStatus::Failed,
        ] {
            assert!(validate_transition(status, status).is_err());
        }
    }

    #[test]
    fn test_all_valid_transitions_count() {
        let all = [
            TurnStatus::Pending,
            TurnStatus::SourcesLoading,
            TurnStatus::AwaitingStream,
            TurnStatus::Streaming,
            TurnStatus::Complete,
            TurnStatus::Failed,
        ];
        let mut valid_count = 0;
        for from in &all {
            for to in &all {
                if validate_transition(*from, *to).is_ok() {
                    valid_count += 1;
                }
            }
        }
        assert_eq!(valid_count, 8, "Expected exactly 8 valid transitions");
    }

    // =====================================================================
    // Channel lifecycle
    // =====================================================================

    #[test]
    fn test_new_channel_is_pending() {
        let channel = TurnChannel::new("what is rust");
        assert_eq!(channel.status(), TurnStatus::Pending);
        assert_eq!(channel.turn().query, "what is rust");
    }

    #[test]
    fn test_happy_path_to_complete() {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        channel.sources_loaded(SourceSet::default()).unwrap();
        assert_eq!(channel.status(), TurnStatus::AwaitingStream);
        channel.append_token("Hel");
        assert_eq!(channel.status(), TurnStatus::Streaming);
        channel.append_token("lo");
        channel.stream_ended().unwrap();
        assert_eq!(channel.status(), TurnStatus::Complete);
        assert_eq!(channel.turn().answer, "Hello");
        assert!(channel.turn().error.is_none());
    }

    #[test]
    fn test_tokens_concatenate_in_arrival_order() {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        channel.sources_loaded(SourceSet::default()).unwrap();
        for chunk in ["t1", "t2", "t3", "t4"] {
            channel.append_token(chunk);
        }
        assert_eq!(channel.turn().answer, "t1t2t3t4");
    }

    #[test]
    fn test_fetch_failure_stores_verbatim_message() {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        channel.fetch_failed("503 Service Unavailable").unwrap();
        assert_eq!(channel.status(), TurnStatus::Failed);
        assert_eq!(
            channel.turn().error.as_deref(),
            Some("503 Service Unavailable")
        );
        assert!(channel.turn().answer.is_empty());
    }

    #[test]
    fn test_fetch_failed_only_valid_while_loading() {
        let mut channel = TurnChannel::new("q");
        assert!(channel.fetch_failed("boom").is_err());

        let mut channel = streaming_channel();
        assert!(channel.fetch_failed("boom").is_err());
    }

    #[test]
    fn test_stream_failure_keeps_partial_answer() {
        let mut channel = streaming_channel();
        channel.append_token("lo");
        channel.stream_failed("model overloaded").unwrap();
        assert_eq!(channel.status(), TurnStatus::Failed);
        assert_eq!(channel.turn().answer, "Hello");
        assert_eq!(channel.turn().error.as_deref(), Some("model overloaded"));
    }

    #[test]
    fn test_stream_failure_before_first_token() {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        channel.sources_loaded(SourceSet::default()).unwrap();
        channel.stream_failed("connection reset").unwrap();
        assert_eq!(channel.status(), TurnStatus::Failed);
        assert!(channel.turn().answer.is_empty());
    }

    #[test]
    fn test_stream_end_with_no_tokens_is_complete_and_empty() {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        channel.sources_loaded(SourceSet::default()).unwrap();
        channel.stream_ended().unwrap();
        assert_eq!(channel.status(), TurnStatus::Complete);
        assert!(channel.turn().answer.is_empty());
    }

    #[test]
    fn test_late_token_after_complete_is_noop() {
        let mut channel = streaming_channel();
        channel.stream_ended().unwrap();
        channel.append_token("late");
        assert_eq!(channel.turn().answer, "Hel");
        assert_eq!(channel.status(), TurnStatus::Complete);
    }

    #[test]
    fn test_late_token_after_failed_is_noop() {
        let mut channel = streaming_channel();
        channel.stream_failed("err").unwrap();
        channel.append_token("late");
        assert_eq!(channel.turn().answer, "Hel");
    }

    #[test]
    fn test_token_before_sources_is_dropped() {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        channel.append_token("early");
        assert!(channel.turn().answer.is_empty());
        assert_eq!(channel.status(), TurnStatus::SourcesLoading);
    }

    #[test]
    fn test_terminal_events_after_terminal_rejected() {
        let mut channel = streaming_channel();
        channel.stream_ended().unwrap();
        assert!(channel.stream_ended().is_err());
        assert!(channel.stream_failed("late").is_err());
    }

    #[test]
    fn test_freeze_mid_stream() {
        let channel = streaming_channel();
        let turn = channel.freeze();
        assert_eq!(turn.status, TurnStatus::Streaming);
        assert_eq!(turn.answer, "Hel");
    }

    #[test]
    fn test_empty_token_is_appended_without_state_change() {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        channel.sources_loaded(SourceSet::default()).unwrap();
        channel.append_token("");
        // Even an empty chunk counts as the first token.
        assert_eq!(channel.status(), TurnStatus::Streaming);
        assert!(channel.turn().answer.is_empty());
    }

    #[test]
    fn test_sources_recorded_on_load() {
        let mut channel = TurnChannel::new("q");
        channel.begin_fetch().unwrap();
        let sources: SourceSet = serde_json::from_str(
            r#"{"searchResults":[{"position":1,"title":"T","link":"https://x","snippet":"S","source":"x.com"}]}"#,
        )
        .unwrap();
        channel.sources_loaded(sources).unwrap();
        assert_eq!(channel.turn().sources.search_results.len(), 1);
    }
}
