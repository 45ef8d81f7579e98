use thiserror::Error;

/// Top-level error type for the Lantern system.
///
/// Each variant wraps a subsystem-specific concern. Downstream crates define
/// their own error types and implement `From<SubsystemError> for LanternError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LanternError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source fetch error: {0}")]
    SourceFetch(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for LanternError {
    fn from(err: toml::de::Error) -> Self {
        LanternError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LanternError {
    fn from(err: toml::ser::Error) -> Self {
        LanternError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LanternError {
    fn from(err: serde_json::Error) -> Self {
        LanternError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Lantern operations.
pub type Result<T> = std::result::Result<T, LanternError>;
