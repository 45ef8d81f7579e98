//! Client-side transport errors.

use lantern_core::LanternError;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed stream frame: {0}")]
    MalformedFrame(String),
}

impl From<ClientError> for LanternError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) => LanternError::SourceFetch(e.to_string()),
            ClientError::WebSocket(e) => LanternError::Transport(e.to_string()),
            ClientError::MalformedFrame(msg) => LanternError::Stream(msg),
        }
    }
}
