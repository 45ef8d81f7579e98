//! CLI argument definitions for the Lantern application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Lantern — a streaming conversational search client.
#[derive(Parser, Debug)]
#[command(name = "lantern", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP endpoint for the source-ranking service.
    #[arg(long = "search-endpoint")]
    pub search_endpoint: Option<String>,

    /// WebSocket URL for the token stream.
    #[arg(long = "stream-url")]
    pub stream_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Run a single query and exit instead of starting the prompt.
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > LANTERN_CONFIG env var > ~/.lantern/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("LANTERN_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the source-ranking endpoint.
    ///
    /// Priority: --search-endpoint flag > LANTERN_SEARCH_ENDPOINT env var > config file value.
    pub fn resolve_search_endpoint(&self, config_value: &str) -> String {
        if let Some(ref endpoint) = self.search_endpoint {
            return endpoint.clone();
        }
        if let Ok(endpoint) = std::env::var("LANTERN_SEARCH_ENDPOINT") {
            return endpoint;
        }
        config_value.to_string()
    }

    /// Resolve the stream socket URL.
    ///
    /// Priority: --stream-url flag > LANTERN_STREAM_URL env var > config file value.
    pub fn resolve_stream_url(&self, config_value: &str) -> String {
        if let Some(ref url) = self.stream_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("LANTERN_STREAM_URL") {
            return url;
        }
        config_value.to_string()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_value: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_value.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".lantern").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".lantern").join("config.toml");
    }
    PathBuf::from("config.toml")
}
