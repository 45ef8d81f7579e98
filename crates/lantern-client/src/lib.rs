//! Network transports for Lantern.
//!
//! Concrete collaborators behind the engine's seams: an HTTP source
//! fetcher for the synchronous ranking call and a WebSocket push channel
//! for token streaming.

pub mod error;
pub mod fetch;
pub mod socket;

pub use error::ClientError;
pub use fetch::HttpSourceFetcher;
pub use socket::{connect, WsConnection, WsEvents};
