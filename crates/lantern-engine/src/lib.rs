//! Conversation engine for Lantern.
//!
//! Drives search turns through their lifecycle: source fetch, token
//! streaming over the shared push channel, citation resolution, and the
//! sealed-turn conversation record that feeds follow-up context.

pub mod channel;
pub mod citation;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod store;
pub mod transport;

pub use channel::{validate_transition, TurnChannel};
pub use citation::{resolve, Segment};
pub use error::EngineError;
pub use orchestrator::{SourceFetcher, StreamOrchestrator};
pub use store::ConversationStore;
pub use transport::{PushConnection, PushTransport};
