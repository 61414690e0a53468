//! Wire types for the framed channel.
//!
//! - **Envelope** (inbound): `{"command": "..."}`, other fields ignored
//! - **BridgeResult** (outbound): `{"success": true, "response": "..."}` or
//!   `{"success": false, "error": "..."}`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CommandError;

/// Inbound request carrying one control port command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Envelope {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    /// The command text, if present and not blank.
    pub fn command(&self) -> Option<&str> {
        self.command
            .as_deref()
            .filter(|command| !command.trim().is_empty())
    }
}

// Any JSON value is accepted; only a string `command` member is meaningful.
impl From<Value> for Envelope {
    fn from(value: Value) -> Self {
        Self {
            command: value
                .get("command")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }
}

/// Outbound reply, exactly one per inbound envelope.
///
/// Exactly one of `response`/`error` is set, selected by `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResult {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BridgeResult {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(response.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl From<CommandError> for BridgeResult {
    fn from(err: CommandError) -> Self {
        Self::failure(err.to_string())
    }
}
