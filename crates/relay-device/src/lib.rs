//! Client for the device's own HTTP API.
//!
//! While on the local network the device serves a small WiFi
//! configuration API:
//! - `GET /wifi/status`, `GET /wifi/scan`
//! - `POST /wifi/connect`, `POST /wifi/save` (form-encoded `ssid`, `password`)
//! - `GET /ngrok/url`, `POST /ngrok/url` (form-encoded `url`)
//!
//! Every response uses the same [`Envelope`], whose `data` field carries a
//! second JSON document as a string.
//!
//! # Example
//!
//! ```ignore
//! use relay_device::DeviceClient;
//!
//! let device = DeviceClient::new("192.168.1.100");
//! let status = device.status().await?;
//! println!("{} ({} dBm)", status.ip_address, status.signal_strength);
//! ```

pub mod client;
pub mod wifi;

pub use client::{base_url, DeviceClient, DeviceError};
pub use wifi::*;
