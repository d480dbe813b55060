// ABOUTME: Error types for calls across the backend RPC boundary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to start backend '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Error text reported by the backend for a specific command.
    #[error("{0}")]
    Remote(String),

    #[error("Backend {command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("Backend connection closed")]
    Closed,

    #[error("Malformed backend frame: {0}")]
    InvalidFrame(String),

    #[error("Unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
