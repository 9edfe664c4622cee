//! Device-facing codec.
//!
//! The device polls with a plain GET and reads the body as text: either a
//! command string or the `NO_OP` sentinel. Results come back as a JSON body.

use relay_core::{DeviceCommand, DeviceResult};
use serde_json::{Map, Value};
use thiserror::Error;

/// Body of a poll response when nothing is pending.
pub const NO_OP: &str = "NO_OP";

/// Errors that can occur while decoding a device message.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The result body was not valid JSON.
    #[error("Failed to parse result body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// What a device poll receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResponse {
    Command(DeviceCommand),
    NoOp,
}

impl PollResponse {
    /// Text body sent to the device.
    pub fn encode(&self) -> String {
        match self {
            PollResponse::Command(command) => command.wire(),
            PollResponse::NoOp => NO_OP.to_string(),
        }
    }
}

impl From<Option<DeviceCommand>> for PollResponse {
    fn from(command: Option<DeviceCommand>) -> Self {
        command.map_or(PollResponse::NoOp, PollResponse::Command)
    }
}

/// Decode a result body posted by the device.
///
/// An empty body is an empty object: the device still answered, so the
/// waiting operator gets `{}` rather than a timeout.
pub fn decode_result(body: &[u8]) -> Result<DeviceResult, CodecError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DeviceResult::Opaque(Value::Object(Map::new())));
    }
    let value: serde_json::Value = serde_json::from_slice(body)?;
    Ok(DeviceResult::from_value(value))
}
