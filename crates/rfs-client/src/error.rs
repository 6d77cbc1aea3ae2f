//! Client error types.

use rfs_proto::CodecError;
use std::path::PathBuf;

/// Everything that can go wrong while running a client command.
///
/// Input errors are detected before any network traffic. Transport errors
/// end the current connection.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Not connected. Use `connect <host> <port>` first")]
    NotConnected,

    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No server at {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection timed out")]
    Timeout,

    #[error("Server closed the connection")]
    Closed,

    #[error("Connection lost: {0}")]
    Transport(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether the error tore down an open connection.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout | ClientError::Closed | ClientError::Transport(_)
        )
    }
}
