//! # relay-web
//!
//! HTTP surface of the device relay.
//!
//! This crate provides:
//! - The mailbox endpoints used by the device and the operator UI
//! - An LLM proxy for text and image questions
//! - A small image store the device uploads captures to
//! - Static file serving for the operator UI
//!
//! ## Architecture
//!
//! The web layer is built on Axum and provides these route groups:
//!
//! - `/esp32/` - Device poll/result and operator commands
//! - `/gpt/` - Completion proxy (`ask`, `solve`, `vision`)
//! - `/image/` - Stored image listing, download and upload
//! - `/` - Static files from the public directory
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_web::{create_router, ServerState};
//!
//! let state = Arc::new(ServerState::new(&config, completions));
//! let app = create_router(state);
//!
//! let listener = TcpListener::bind(config.bind_addr).await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::path::PathBuf;
use std::sync::Arc;

use relay_core::{KeyStore, ModelConfig, RelayConfig};
use relay_providers::CompletionProvider;
use relay_server::Relay;

/// Shared server state for all route handlers.
///
/// One instance exists per process and is shared across all Axum handlers
/// behind an [`Arc`].
pub struct ServerState {
    /// Mailbox and wait gate for the single device.
    pub relay: Relay,

    /// API keys handed to the completion provider.
    pub keys: KeyStore,

    pub completions: Arc<dyn CompletionProvider>,

    pub models: ModelConfig,

    pub images_dir: PathBuf,

    pub public_dir: PathBuf,
}

impl ServerState {
    /// Build state from startup configuration.
    pub fn new(config: &RelayConfig, completions: Arc<dyn CompletionProvider>) -> Self {
        Self {
            relay: Relay::new(config.command_timeout),
            keys: KeyStore::new(config.text_key.clone(), config.image_key.clone()),
            completions,
            models: config.models.clone(),
            images_dir: config.images_dir.clone(),
            public_dir: config.public_dir.clone(),
        }
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<ServerState>;
