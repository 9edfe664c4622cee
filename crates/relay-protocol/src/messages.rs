//! Relay HTTP message types.
//!
//! Request bodies keep every field optional so that a missing field can be
//! reported as a validation error instead of a deserialization failure:
//! - Operator → Relay: CommandRequest, NgrokRequest, KeyRequest, VisionRequest
//! - Relay → Operator: Ack, LogsResponse
//!
//! All bodies are JSON.

use relay_core::{DeviceResult, LogEntry};
use serde::{Deserialize, Serialize};

/// Error string returned when the device does not answer in time.
pub const TIMEOUT_MESSAGE: &str = "Command timed out";

/// Body of `POST /esp32/command`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Body of `POST /esp32/ngrok/set`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NgrokRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Body of the key update endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Body of `POST /gpt/vision`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionRequest {
    /// Base64-encoded image, without a `data:` prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

/// Generic acknowledgement.
///
/// # Example
/// ```json
/// { "success": true, "message": "Command SNAP queued" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Body of `GET /esp32/logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

/// The body returned to an operator whose wait expired.
pub fn timeout_result() -> DeviceResult {
    DeviceResult::error(TIMEOUT_MESSAGE)
}

/// Trim a required text field; `None` when absent or blank.
pub fn required(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
