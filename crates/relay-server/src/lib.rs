//! # relay-server
//!
//! Operator/device rendezvous for the relay.
//!
//! The device cannot accept inbound connections, so an operator request
//! queues a command in the [`Mailbox`](relay_core::Mailbox) and then waits
//! on a [`WaitGate`] until the device, polling on its own schedule, posts a
//! result or the timeout expires. [`Relay`] ties the two together and is
//! what the HTTP layer holds.

pub mod gate;
pub mod relay;

pub use gate::WaitGate;
pub use relay::{Relay, WaitOutcome};
pub use relay_core::{DeviceCommand, DeviceResult, LogRing, Mailbox};
