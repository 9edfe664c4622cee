//! Device API payloads.

use serde::{Deserialize, Serialize};

/// Address reported by a device that has no IP yet.
pub const UNASSIGNED_IP: &str = "0.0.0.0";

/// Response wrapper used by every device endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,

    #[serde(default)]
    pub message: String,

    /// A JSON document encoded as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// `GET /wifi/status` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiStatus {
    pub connected: bool,

    #[serde(default)]
    pub ip_address: String,

    #[serde(default)]
    pub ssid: String,

    /// RSSI in dBm.
    #[serde(default)]
    pub signal_strength: i32,
}

impl WifiStatus {
    /// Whether the device can be reached for OTA updates.
    pub fn is_reachable(&self) -> bool {
        self.connected && !self.ip_address.is_empty() && self.ip_address != UNASSIGNED_IP
    }

    /// Browser URL of the OTA upload page.
    pub fn ota_url(&self) -> String {
        format!("http://{}/", self.ip_address)
    }
}

/// `GET /wifi/scan` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanData {
    #[serde(default)]
    pub networks: Vec<String>,
}

/// `GET /ngrok/url` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgrokData {
    #[serde(default)]
    pub ngrok_url: String,
}

/// Form body of `/wifi/connect` and `/wifi/save`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}
