use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Sources
// =============================================================================

/// One ranked web source for a turn.
///
/// Identity is `position` (1-based), stable within the turn's source list
/// and immutable once fetched. Citation markers in the answer text refer
/// to this position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub position: u32,
    pub title: String,
    pub link: String,
    pub snippet: String,
    /// Display label of the originating site. Wire name: `source`.
    #[serde(rename = "source")]
    pub origin_label: String,
}

/// One ranked video source for a turn.
///
/// Video results carry no stable position; identity is the list index
/// within the turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    pub title: String,
    pub link: String,
    pub thumbnail: String,
    #[serde(rename = "source")]
    pub origin_label: String,
}

/// The complete source material for one turn.
///
/// Produced atomically by a single source-fetch call; never partially
/// populated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSet {
    #[serde(default)]
    pub search_results: Vec<Source>,
    #[serde(default)]
    pub video_results: Vec<VideoSource>,
}

impl SourceSet {
    /// True when neither web nor video results are present.
    pub fn is_empty(&self) -> bool {
        self.search_results.is_empty() && self.video_results.is_empty()
    }

    /// Look up a web source by its 1-based citation position.
    pub fn by_position(&self, position: u32) -> Option<&Source> {
        if position == 0 {
            return None;
        }
        self.search_results.get(position as usize - 1)
    }
}

// =============================================================================
// Turns
// =============================================================================

/// Lifecycle status of a turn.
///
/// A turn moves strictly forward:
/// Pending -> SourcesLoading -> AwaitingStream -> Streaming -> Complete,
/// with Failed reachable from SourcesLoading, AwaitingStream, and Streaming.
/// Complete and Failed are absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Created but not yet submitted.
    Pending,
    /// Source-fetch request in flight.
    SourcesLoading,
    /// Sources loaded; generation requested, no token received yet.
    AwaitingStream,
    /// Tokens arriving.
    Streaming,
    /// Terminal success.
    Complete,
    /// Terminal failure; the turn's `error` holds the transport message.
    Failed,
}

impl TurnStatus {
    /// True for the absorbing states `Complete` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnStatus::Complete | TurnStatus::Failed)
    }
}

/// One query/answer/source-set unit within a conversation.
///
/// `answer` is append-only while streaming. Once the turn is sealed into
/// the conversation history, every field is immutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub query: String,
    pub sources: SourceSet,
    pub answer: String,
    pub status: TurnStatus,
    /// Verbatim transport error text. `Some` iff `status == Failed`.
    pub error: Option<String>,
    /// Epoch seconds at submission.
    pub started_at: i64,
}

impl Turn {
    /// Create a fresh `Pending` turn for a query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            sources: SourceSet::default(),
            answer: String::new(),
            status: TurnStatus::Pending,
            error: None,
            started_at: Utc::now().timestamp(),
        }
    }

    /// The query/answer projection sent to the backend as context.
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            query: self.query.clone(),
            response: self.answer.clone(),
        }
    }
}

/// Read-only projection of a sealed turn used as conversational context.
///
/// Serializes as `{query, response}` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub response: String,
}

// =============================================================================
// Conversation snapshot
// =============================================================================

/// Render-ready view of the whole conversation at one instant.
///
/// Sealed turns in order, followed by the in-flight turn if one exists.
/// Cloned out to observers on every state transition so the UI can
/// re-render mid-stream without touching engine state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConversationSnapshot {
    pub turns: Vec<Turn>,
}

impl ConversationSnapshot {
    /// Number of turns, sealed plus in-flight.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when the conversation has no turns at all.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The in-flight turn, if the last turn has not reached a terminal state.
    pub fn in_flight(&self) -> Option<&Turn> {
        self.turns.last().filter(|t| !t.status.is_terminal())
    }
}

// =============================================================================
// Tests
// =============================================================================
