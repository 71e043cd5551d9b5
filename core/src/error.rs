//! Structured error types for kullect
//!
//! Only transport failures are errors in the Rust sense. Configuration
//! problems and unsupported requests are reported to the host through the
//! protocol and never surface as an `AgentError`.

use thiserror::Error;

/// Fatal failure of the agent's message channel
#[derive(Error, Debug)]
pub enum AgentError {
    // =========================================================================
    // Inbound Errors
    // =========================================================================
    /// A frame could not be decoded into a request
    #[error("malformed request at frame {frame}: {source}")]
    Decode {
        frame: u64,
        #[source]
        source: serde_json::Error,
    },

    // =========================================================================
    // Outbound Errors
    // =========================================================================
    /// A response could not be serialized
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    /// The outbound task is gone and the response queue no longer accepts messages
    #[error("response queue closed")]
    QueueClosed,

    /// The outbound task panicked or was cancelled
    #[error("outbound task failed: {message}")]
    OutboundTask { message: String },

    // =========================================================================
    // External Error Wrappers
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Whether the host side of the channel went away rather than misbehaved
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
            ),
            Self::QueueClosed => true,
            Self::Decode { .. } | Self::Encode(_) | Self::OutboundTask { .. } => false,
        }
    }
}

/// Combined configuration failure reported in the init response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid configuration:{message}")]
pub struct ConfigError {
    /// Every problem found, concatenated in option order
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type alias using AgentError
pub type Result<T> = std::result::Result<T, AgentError>;
