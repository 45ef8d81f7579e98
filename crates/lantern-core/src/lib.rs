//! Core domain types for Lantern, a conversational search client.
//!
//! Defines the turn/conversation data model, the wire shapes exchanged with
//! the source-ranking and streaming generation services, the TOML-backed
//! configuration, and the top-level error type shared across crates.

pub mod config;
pub mod error;
pub mod types;
pub mod wire;

pub use config::LanternConfig;
pub use error::{LanternError, Result};
pub use types::*;
pub use wire::{SourceFetchRequest, StreamEvent, StreamRequest};
