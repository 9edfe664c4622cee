//! Relay configuration.
//!
//! Configuration is read once at startup from environment-style key/value
//! pairs. [`RelayConfig::from_env`] reads the process environment;
//! [`RelayConfig::from_lookup`] takes any lookup function so tests can supply
//! their own values.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TEXT_MODEL: &str = "kwaipilot/kat-coder-pro:free";
pub const DEFAULT_VISION_MODEL: &str = "openai/gpt-4o";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `PORT` is not a usable TCP port.
    #[error("bad port: {0}")]
    InvalidPort(String),

    /// `BIND_HOST` is not an IP address.
    #[error("bad bind host: {0}")]
    InvalidHost(String),

    /// `COMMAND_TIMEOUT_MS` is not a positive integer.
    #[error("bad command timeout: {0}")]
    InvalidTimeout(String),
}

/// Completion API settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_base_url: String,
    /// Model used for text questions.
    pub text_model: String,
    /// Model used for image questions.
    pub vision_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// How long an operator request waits for the device.
    pub command_timeout: Duration,

    /// Directory holding stored images.
    pub images_dir: PathBuf,

    /// Directory of static files served at `/`.
    pub public_dir: PathBuf,

    pub models: ModelConfig,

    /// Initial text-model API key.
    pub text_key: String,

    /// Initial image-model API key.
    pub image_key: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            images_dir: PathBuf::from("images"),
            public_dir: PathBuf::from("public"),
            models: ModelConfig::default(),
            text_key: String::new(),
            image_key: String::new(),
        }
    }
}

impl RelayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source. Missing or empty values fall
    /// back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw)),
            },
            None => DEFAULT_PORT,
        };

        let host = match get("BIND_HOST") {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidHost(raw.clone()))?,
            None => defaults.bind_addr.ip(),
        };

        let command_timeout = match get("COMMAND_TIMEOUT_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => defaults.command_timeout,
        };

        let text_key = get("OPENROUTER_API_KEY").unwrap_or_default();
        let image_key = [
            "IMAGE_OPENROUTER_API_KEY",
            "IMAGE_API_KEY",
            "OPENROUTER_API_KEY",
            "REPLICATE_API_TOKEN",
        ]
        .into_iter()
        .find_map(|key| get(key))
        .unwrap_or_default();

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            command_timeout,
            images_dir: get("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.images_dir),
            public_dir: get("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            models: ModelConfig {
                api_base_url: get("OPENROUTER_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.models.api_base_url),
                text_model: get("TEXT_MODEL").unwrap_or(defaults.models.text_model),
                vision_model: get("VISION_MODEL").unwrap_or(defaults.models.vision_model),
            },
            text_key,
            image_key,
        })
    }
}
