//! Device relay data model.
//!
//! These types describe what travels through the mailbox:
//! - [`DeviceCommand`] - the text command handed to the device on poll
//! - [`DeviceResult`] - the JSON body the device posts back
//!
//! The device speaks plain strings (`"<VERB>"` or `"<VERB> <ARG>"`) and
//! free-form JSON. Both types keep the original bytes recoverable so that
//! unknown commands and undocumented result shapes pass through unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ============================================================================
// Commands (server -> device)
// ============================================================================

/// A command waiting to be picked up by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Scan for nearby WiFi networks.
    ScanNetworks,
    /// Report connection status.
    GetStatus,
    /// Capture an image.
    Snap,
    /// Capture and solve the question in view.
    Solve,
    /// Update the public tunnel URL the device polls.
    SetNgrok(String),
    /// Replace the text-model API key held by the device.
    SetTextKey(String),
    /// Replace the image-model API key held by the device.
    SetImageKey(String),
    /// Any other command, passed through verbatim.
    Custom(String),
}

impl DeviceCommand {
    /// The command verb (first word of the wire form).
    pub fn verb(&self) -> &str {
        match self {
            DeviceCommand::ScanNetworks => "SCAN_NETWORKS",
            DeviceCommand::GetStatus => "GET_STATUS",
            DeviceCommand::Snap => "SNAP",
            DeviceCommand::Solve => "SOLVE",
            DeviceCommand::SetNgrok(_) => "SET_NGROK",
            DeviceCommand::SetTextKey(_) => "SET_TEXT_KEY",
            DeviceCommand::SetImageKey(_) => "SET_IMAGE_KEY",
            DeviceCommand::Custom(raw) => raw.split_whitespace().next().unwrap_or(""),
        }
    }

    /// The string sent to the device on poll.
    pub fn wire(&self) -> String {
        self.to_string()
    }

    /// Log-safe rendering. API keys are never written out.
    pub fn redacted(&self) -> String {
        match self {
            DeviceCommand::SetTextKey(_) | DeviceCommand::SetImageKey(_) => {
                format!("{} <redacted>", self.verb())
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::SetNgrok(arg)
            | DeviceCommand::SetTextKey(arg)
            | DeviceCommand::SetImageKey(arg) => write!(f, "{} {}", self.verb(), arg),
            DeviceCommand::Custom(raw) => f.write_str(raw),
            _ => f.write_str(self.verb()),
        }
    }
}

/// Errors from parsing a caller-supplied command string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("command is empty")]
    Empty,
}

impl FromStr for DeviceCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let (verb, arg) = match raw.split_once(' ') {
            Some((verb, arg)) => (verb, Some(arg.trim())),
            None => (raw, None),
        };

        let command = match (verb, arg) {
            ("SCAN_NETWORKS", None) => DeviceCommand::ScanNetworks,
            ("GET_STATUS", None) => DeviceCommand::GetStatus,
            ("SNAP", None) => DeviceCommand::Snap,
            ("SOLVE", None) => DeviceCommand::Solve,
            ("SET_NGROK", Some(url)) if !url.is_empty() => DeviceCommand::SetNgrok(url.to_string()),
            ("SET_TEXT_KEY", Some(key)) if !key.is_empty() => {
                DeviceCommand::SetTextKey(key.to_string())
            }
            ("SET_IMAGE_KEY", Some(key)) if !key.is_empty() => {
                DeviceCommand::SetImageKey(key.to_string())
            }
            _ => DeviceCommand::Custom(raw.to_string()),
        };
        Ok(command)
    }
}

// ============================================================================
// Results (device -> server)
// ============================================================================

/// A result body posted by the device.
///
/// Known shapes get typed variants; anything else is kept as
/// [`DeviceResult::Opaque`]. Fields the typed variants don't name are kept in
/// `extra` so serializing a result gives back what the device sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceResult {
    /// The device reported a failure.
    Error(ErrorReport),

    /// Result of `SCAN_NETWORKS`.
    ScanList(ScanReport),

    /// Result of `SOLVE`.
    SolveAnswer(SolveReport),

    /// Result of `GET_STATUS`.
    Status(StatusReport),

    /// Any other JSON value.
    Opaque(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub networks: Vec<ScanNetwork>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a network scan. Older firmware sends bare SSIDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanNetwork {
    Ssid(String),
    Detailed(NetworkInfo),
}

impl ScanNetwork {
    pub fn ssid(&self) -> &str {
        match self {
            ScanNetwork::Ssid(ssid) => ssid,
            ScanNetwork::Detailed(info) => &info.ssid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub ssid: String,

    /// `None` when absent, `Some(None)` when sent as `null`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub rssi: Option<Option<i32>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub answer: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub connected: bool,

    // Optional fields keep absent (`None`) and `null` (`Some(None)`) apart
    // so the body serializes back the way the device sent it.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub ip_address: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub ssid: Option<Option<String>>,

    /// RSSI in dBm.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub signal_strength: Option<Option<i32>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusReport {
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_ref()?.as_deref()
    }

    pub fn ssid(&self) -> Option<&str> {
        self.ssid.as_ref()?.as_deref()
    }

    pub fn signal_strength(&self) -> Option<i32> {
        self.signal_strength.flatten()
    }
}

impl DeviceResult {
    /// Classify an arbitrary JSON body. Never fails.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(result) => result,
            Err(_) => DeviceResult::Opaque(value),
        }
    }

    /// An `{"error": ...}` body.
    pub fn error(message: impl Into<String>) -> Self {
        DeviceResult::Error(ErrorReport {
            error: message.into(),
            extra: Map::new(),
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceResult::Error(_) => "error",
            DeviceResult::ScanList(_) => "scan",
            DeviceResult::SolveAnswer(_) => "solve",
            DeviceResult::Status(_) => "status",
            DeviceResult::Opaque(_) => "opaque",
        }
    }

    /// Compact JSON truncated to `max_chars` characters, with a trailing
    /// ellipsis when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        match json.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &json[..cut]),
            None => json,
        }
    }
}
