//! Error types for the bridge.
//!
//! Two families, matching the two sides of the bridge:
//! - [`ChannelError`]: the framed stdin/stdout channel
//! - [`CommandError`]: a single control port command (always reported back to
//!   the caller as a failure result, never fatal to the process)

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures on the framed message channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Transport or framing failure. Stream alignment is lost.
    #[error("framing error: {0}")]
    Io(#[from] io::Error),

    /// A whole frame was consumed but its body is not a valid message.
    #[error("invalid message payload: {0}")]
    Payload(String),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    /// Outbound message larger than the peer accepts.
    #[error("message of {len} bytes exceeds the {max} byte frame limit")]
    Oversized { len: usize, max: usize },
}

impl ChannelError {
    /// Whether the channel is still aligned on a frame boundary after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Blocking stage that hit the per-operation timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Write,
    Read,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Write => f.write_str("write"),
            Self::Read => f.write_str("read"),
        }
    }
}

/// Failure of one control port command.
///
/// `Display` is the `error` text delivered to the caller.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Request rejected before any network activity.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Connect(#[source] io::Error),

    /// The control port did not accept our credentials. `detail` is for logs only.
    #[error("Authentication failed")]
    Auth { detail: String },

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    Io(#[from] io::Error),
}

impl CommandError {
    pub fn missing_command() -> Self {
        Self::Validation("No command specified".to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn auth(detail: impl Into<String>) -> Self {
        Self::Auth {
            detail: detail.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn timeout(stage: Stage, after: Duration) -> Self {
        Self::Timeout { stage, after }
    }
}
