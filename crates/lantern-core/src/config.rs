use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LanternError, Result};

/// Top-level configuration for the Lantern client.
///
/// Loaded from `~/.lantern/config.toml` by default. Each section corresponds
/// to one collaborator or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanternConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl LanternConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LanternConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LanternError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Source-ranking service (request/response HTTP).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Endpoint for the source-fetch POST.
    pub endpoint: String,
    /// Request timeout in seconds for one source-fetch call.
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5001/api/sources".to_string(),
            request_timeout_secs: 15,
        }
    }
}

/// Streaming generation service (persistent push channel).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// WebSocket URL of the push channel. One connection per conversation.
    pub url: String,
    /// Fail a streaming turn after this many seconds without an event.
    pub stall_timeout_secs: u64,
    /// Maximum query length in characters.
    pub max_query_length: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:5001/stream".to_string(),
            stall_timeout_secs: 60,
            max_query_length: 2000,
        }
    }
}

/// Conversation context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Maximum number of sealed turns sent as context with a follow-up.
    /// Older turns are dropped from the outbound history, never from the
    /// visible conversation.
    pub max_history_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
