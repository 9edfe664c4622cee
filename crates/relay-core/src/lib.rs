//! # relay-core
//!
//! Core state of the device relay.
//!
//! This crate provides:
//! - Command and result types exchanged with the device
//! - The single-slot command mailbox (pending command + result)
//! - A bounded, newest-first event log
//! - The process-wide API key store
//! - Environment-style configuration loading
//!
//! This crate is intentionally runtime-agnostic and contains no async code.
//! Waiting for a result is layered on top by `relay-server`.

pub mod config;
pub mod keys;
pub mod log_ring;
pub mod mailbox;
pub mod model;

pub use config::{ConfigError, ModelConfig, RelayConfig};
pub use keys::{KeyKind, KeyStore};
pub use log_ring::{LogEntry, LogRing, LOG_CAPACITY};
pub use mailbox::{Mailbox, RESULT_PREVIEW_CHARS};
pub use model::*;
