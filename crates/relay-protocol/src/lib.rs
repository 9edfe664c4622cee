//! # relay-protocol
//!
//! Device relay message types and codec.
//!
//! This crate defines the request and response bodies of the relay's HTTP
//! surface and the plain-text poll format spoken by the device.

pub mod codec;
pub mod messages;

pub use codec::*;
pub use messages::*;
