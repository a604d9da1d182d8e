//! Error types for wirerpc.

use thiserror::Error;

/// Main error type for all wirerpc operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Framing error (unbalanced or oversized inbound data).
    #[error("Framing error: {0}")]
    Framing(String),

    /// Protocol error (invalid message for the current session state).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The peer closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using RpcError.
pub type Result<T> = std::result::Result<T, RpcError>;
