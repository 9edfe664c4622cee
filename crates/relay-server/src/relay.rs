//! The relay hub.
//!
//! [`Relay`] owns the device mailbox and the wait gate and exposes the two
//! sides of the rendezvous:
//!
//! - Device side: [`poll`](Relay::poll) and [`post_result`](Relay::post_result),
//!   which never wait.
//! - Operator side: [`request`](Relay::request), which queues a command and
//!   waits for the device, and [`queue`](Relay::queue), which does not wait.
//!
//! There is exactly one relay per device. It is created by the composition
//! root and shared with the HTTP handlers behind an `Arc`.

use std::time::Duration;

use relay_core::{DeviceCommand, DeviceResult, LogRing, Mailbox};
use relay_protocol::PollResponse;
use tracing::{debug, warn};

use crate::gate::WaitGate;

/// How an operator request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// The device posted a result.
    Delivered(DeviceResult),
    /// No result arrived before the timeout. This is an expected outcome.
    TimedOut,
}

impl WaitOutcome {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }

    pub fn into_result(self) -> Option<DeviceResult> {
        match self {
            WaitOutcome::Delivered(result) => Some(result),
            WaitOutcome::TimedOut => None,
        }
    }
}

#[derive(Debug)]
pub struct Relay {
    mailbox: Mailbox,
    result_ready: WaitGate,
    timeout: Duration,
}

impl Relay {
    /// Create a relay whose operator requests wait at most `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            mailbox: Mailbox::new(),
            result_ready: WaitGate::new(),
            timeout,
        }
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn log(&self) -> &LogRing {
        self.mailbox.log()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ========================================================================
    // Device side
    // ========================================================================

    /// Hand the pending command, if any, to the device.
    pub fn poll(&self) -> PollResponse {
        PollResponse::from(self.mailbox.device_poll())
    }

    /// Store a device result and wake one waiting operator.
    pub fn post_result(&self, result: DeviceResult) {
        self.mailbox.post_result(result);
        self.result_ready.open();
    }

    // ========================================================================
    // Operator side
    // ========================================================================

    /// Queue `command` without waiting for the device.
    pub fn queue(&self, command: DeviceCommand) {
        self.mailbox.enqueue(command);
    }

    /// Queue `command` and wait up to the configured timeout for a result.
    pub async fn request(&self, command: DeviceCommand) -> WaitOutcome {
        self.request_with_timeout(command, self.timeout).await
    }

    /// Queue `command` and wait up to `timeout` for a result.
    pub async fn request_with_timeout(
        &self,
        command: DeviceCommand,
        timeout: Duration,
    ) -> WaitOutcome {
        let verb = command.verb().to_string();
        self.mailbox.enqueue(command);

        let outcome = self.await_result(timeout).await;
        if outcome.is_timed_out() {
            warn!("Command {} timed out after {:?}", verb, timeout);
            self.log().append(format!("Command {} timed out", verb));
        }
        outcome
    }

    /// Wait up to `timeout` for the result slot to be filled, consuming it.
    pub async fn await_result(&self, timeout: Duration) -> WaitOutcome {
        match self
            .result_ready
            .wait_for(timeout, || self.mailbox.take_result())
            .await
        {
            Some(result) => {
                debug!("Delivering {} result to operator", result.kind());
                WaitOutcome::Delivered(result)
            }
            None => WaitOutcome::TimedOut,
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(relay_core::config::DEFAULT_COMMAND_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::time::{self, Instant};

    #[test]
    fn test_poll_sentinel() {
        let relay = Relay::default();
        assert_eq!(relay.poll(), PollResponse::NoOp);

        relay.queue(DeviceCommand::Snap);
        assert_eq!(relay.poll(), PollResponse::Command(DeviceCommand::Snap));
        assert_eq!(relay.poll(), PollResponse::NoOp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_times_out() {
        let relay = Relay::new(Duration::from_secs(30));
        let start = Instant::now();

        let outcome = relay.request(DeviceCommand::GetStatus).await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed < Duration::from_millis(30_500));

        let latest = &relay.log().snapshot()[0];
        assert_eq!(latest.message, "Command GET_STATUS timed out");
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_receives_result() {
        let relay = Arc::new(Relay::new(Duration::from_secs(30)));

        let device = {
            let relay = relay.clone();
            tokio::spawn(async move {
                loop {
                    if let PollResponse::Command(cmd) = relay.poll() {
                        assert_eq!(cmd, DeviceCommand::ScanNetworks);
                        break;
                    }
                    time::sleep(Duration::from_millis(100)).await;
                }
                time::sleep(Duration::from_secs(2)).await;
                relay.post_result(DeviceResult::from_value(json!({"networks": ["Home"]})));
            })
        };

        let outcome = relay.request(DeviceCommand::ScanNetworks).await;
        device.await.unwrap();

        let result = outcome.into_result().expect("device result");
        assert_eq!(result.to_value(), json!({"networks": ["Home"]}));
        assert_eq!(relay.mailbox().take_result(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_is_left_for_next_taker() {
        let relay = Relay::new(Duration::from_millis(500));

        let outcome = relay.request(DeviceCommand::Snap).await;
        assert!(outcome.is_timed_out());

        // The device answers after the operator gave up.
        relay.post_result(DeviceResult::error("too late"));

        let outcome = relay.await_result(Duration::from_millis(10)).await;
        assert_eq!(outcome, WaitOutcome::Delivered(DeviceResult::error("too late")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_request_discards_stale_result() {
        let relay = Relay::new(Duration::from_millis(500));
        relay.post_result(DeviceResult::error("stale"));

        let outcome = relay.request(DeviceCommand::GetStatus).await;
        assert!(outcome.is_timed_out());
    }
}
