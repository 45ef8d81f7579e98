//! Wire shapes exchanged with the two backend collaborators.
//!
//! The source-ranking service speaks request/response JSON over HTTP; the
//! streaming generation service speaks JSON text frames over one persistent
//! bidirectional channel, tagged by an `event` field.

use serde::{Deserialize, Serialize};

use crate::types::HistoryEntry;

/// Body of the source-fetch call (HTTP POST, one per turn).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFetchRequest {
    pub query: String,
}

/// Outbound generation request emitted on the push channel.
///
/// `history` is the ordered projection of previously sealed turns; the
/// backend answers `query` with these prior exchanges as context.
/// Serializes as `{"event":"stream_request","query":...,"history":[...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename = "stream_request")]
pub struct StreamRequest {
    pub query: String,
    pub history: Vec<HistoryEntry>,
}

/// Inbound events pushed by the streaming generation service.
///
/// `Token` carries one incremental answer chunk, appended verbatim (no
/// trimming or normalization). `StreamEnd` and `StreamError` are terminal
/// for their turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    Token { data: String },
    StreamEnd,
    StreamError { error: String },
}

impl StreamEvent {
    /// Wire event name, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamEvent::Token { .. } => "token",
            StreamEvent::StreamEnd => "stream_end",
            StreamEvent::StreamError { .. } => "stream_error",
        }
    }

    /// True for `StreamEnd` and `StreamError`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Token { .. })
    }
}
