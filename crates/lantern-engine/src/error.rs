//! Error types for the streaming conversation engine.

use lantern_core::error::LanternError;
use lantern_core::types::TurnStatus;

/// Errors from the conversation engine.
///
/// `SourceFetch` and `Stream` carry the collaborator's message verbatim;
/// it is also stored on the failed turn so the UI can show it in place.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("query exceeds maximum length of {0} characters")]
    QueryTooLong(usize),
    #[error("push channel not connected")]
    NotConnected,
    #[error("a turn is already in flight")]
    TurnAlreadyInFlight,
    #[error("invalid turn transition: {0:?} -> {1:?}")]
    InvalidTransition(TurnStatus, TurnStatus),
    #[error("source fetch failed: {0}")]
    SourceFetch(String),
    #[error("stream failed: {0}")]
    Stream(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<EngineError> for LanternError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SourceFetch(msg) => LanternError::SourceFetch(msg),
            EngineError::Stream(msg) => LanternError::Stream(msg),
            EngineError::NotConnected | EngineError::Transport(_) => {
                LanternError::Transport(err.to_string())
            }
            other => LanternError::Stream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::EmptyQuery;
        assert_eq!(err.to_string(), "query cannot be empty");

        let err = EngineError::QueryTooLong(2000);
        assert_eq!(
            err.to_string(),
            "query exceeds maximum length of 2000 characters"
        );

        let err = EngineError::NotConnected;
        assert_eq!(err.to_string(), "push channel not connected");

        let err = EngineError::SourceFetch("500 Internal Server Error".to_string());
        assert_eq!(
            err.to_string(),
            "source fetch failed: 500 Internal Server Error"
        );

        let err = EngineError::Stream("model overloaded".to_string());
        assert_eq!(err.to_string(), "stream failed: model overloaded");
    }

    #[test]
    fn test_invalid_transition_names_both_states() {
        let err = EngineError::InvalidTransition(TurnStatus::Complete, TurnStatus::Streaming);
        let msg = err.to_string();
        assert!(msg.contains("Complete"), "should mention source state");
        assert!(msg.contains("Streaming"), "should mention target state");
    }

    #[test]
    fn test_conversion_to_lantern_error() {
        let err: LanternError = EngineError::SourceFetch("404 Not Found".to_string()).into();
        assert!(matches!(err, LanternError::SourceFetch(_)));
        assert!(err.to_string().contains("404 Not Found"));

        let err: LanternError = EngineError::NotConnected.into();
        assert!(matches!(err, LanternError::Transport(_)));

        let err: LanternError = EngineError::EmptyQuery.into();
        assert!(matches!(err, LanternError::Stream(_)));
    }
}
