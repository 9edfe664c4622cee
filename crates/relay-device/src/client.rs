//! HTTP client for the device API.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::wifi::{Credentials, Envelope, NgrokData, ScanData, WifiStatus};

/// Errors that can occur while talking to the device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The request never completed or the reply was not an envelope.
    #[error("Request to device failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The device answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The envelope had no `data` where one was expected.
    #[error("Device response from {0} carried no data")]
    MissingData(&'static str),

    /// The `data` document did not have the expected shape.
    #[error("Invalid data from device: {0}")]
    InvalidData(#[from] serde_json::Error),
}

/// Base URL for a `host[:port]` or full `http(s)://` address, without a
/// trailing slash. Bare addresses get `http://`.
pub fn base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: String,
}

impl DeviceClient {
    /// Create a client for the device at `address` (`host[:port]` or a full
    /// `http://` URL).
    pub fn new(address: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url(address),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_envelope(&self, path: &'static str) -> Result<Envelope, DeviceError> {
        debug!("GET {}{}", self.base_url, path);
        let envelope: Envelope = self.http.get(self.url(path)).send().await?.json().await?;
        accept(envelope)
    }

    async fn post_form<T: serde::Serialize + ?Sized>(
        &self,
        path: &'static str,
        form: &T,
    ) -> Result<Envelope, DeviceError> {
        debug!("POST {}{}", self.base_url, path);
        let envelope: Envelope = self
            .http
            .post(self.url(path))
            .form(form)
            .send()
            .await?
            .json()
            .await?;
        accept(envelope)
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, DeviceError> {
        let envelope = self.get_envelope(path).await?;
        let data = envelope.data.ok_or(DeviceError::MissingData(path))?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Current WiFi connection state.
    pub async fn status(&self) -> Result<WifiStatus, DeviceError> {
        self.get_data("/wifi/status").await
    }

    /// SSIDs of visible networks.
    pub async fn scan(&self) -> Result<Vec<String>, DeviceError> {
        let scan: ScanData = self.get_data("/wifi/scan").await?;
        Ok(scan.networks)
    }

    /// Join a network. Returns the device's message.
    pub async fn connect(&self, ssid: &str, password: &str) -> Result<String, DeviceError> {
        let envelope = self
            .post_form("/wifi/connect", &Credentials { ssid, password })
            .await?;
        Ok(envelope.message)
    }

    /// Persist credentials on the device. Returns the device's message.
    pub async fn save(&self, ssid: &str, password: &str) -> Result<String, DeviceError> {
        let envelope = self
            .post_form("/wifi/save", &Credentials { ssid, password })
            .await?;
        Ok(envelope.message)
    }

    /// The tunnel URL the device polls.
    pub async fn ngrok_url(&self) -> Result<String, DeviceError> {
        let data: NgrokData = self.get_data("/ngrok/url").await?;
        Ok(data.ngrok_url)
    }

    pub async fn set_ngrok_url(&self, url: &str) -> Result<String, DeviceError> {
        let envelope = self.post_form("/ngrok/url", &[("url", url)]).await?;
        Ok(envelope.message)
    }
}

fn accept(envelope: Envelope) -> Result<Envelope, DeviceError> {
    if envelope.success {
        Ok(envelope)
    } else {
        Err(DeviceError::Rejected(envelope.message))
    }
}
