//! Single-slot command mailbox.
//!
//! The mailbox is the rendezvous point between the operator and a device
//! that can only make outbound requests:
//!
//! - the operator [`enqueue`](Mailbox::enqueue)s a command,
//! - the device picks it up with [`device_poll`](Mailbox::device_poll) and
//!   later answers with [`post_result`](Mailbox::post_result),
//! - the operator collects the answer with [`take_result`](Mailbox::take_result).
//!
//! Both slots hold at most one value and are overwritten, not queued.
//! A command is handed to exactly one poll; a result is handed to exactly
//! one taker. There is no correlation between a command and the result that
//! eventually fills the result slot.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::log_ring::LogRing;
use crate::model::{DeviceCommand, DeviceResult};

/// Characters of a posted result echoed into the log.
pub const RESULT_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Default)]
struct Slots {
    pending: Option<DeviceCommand>,
    result: Option<DeviceResult>,
}

/// Pending-command and result registers plus the relay event log.
#[derive(Debug, Default)]
pub struct Mailbox {
    slots: Mutex<Slots>,
    log: LogRing,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mailbox that logs into `log`.
    pub fn with_log(log: LogRing) -> Self {
        Self {
            slots: Mutex::default(),
            log,
        }
    }

    pub fn log(&self) -> &LogRing {
        &self.log
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        // Every critical section leaves both slots valid.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `command` for the device.
    ///
    /// Replaces any command the device has not picked up yet and discards a
    /// stale result.
    pub fn enqueue(&self, command: DeviceCommand) {
        let label = command.redacted();
        let replaced = {
            let mut slots = self.slots();
            slots.result = None;
            slots.pending.replace(command)
        };

        if let Some(previous) = replaced {
            tracing::debug!("Discarding undelivered command {}", previous.redacted());
        }
        self.log.append(format!("Queuing command: {}", label));
    }

    /// Hand the pending command to the device, clearing the slot.
    ///
    /// Returns `None` when nothing is pending.
    pub fn device_poll(&self) -> Option<DeviceCommand> {
        let command = self.slots().pending.take()?;
        self.log
            .append(format!("Delivered command {} to device", command.verb()));
        Some(command)
    }

    /// Store a result from the device, overwriting any unconsumed one.
    pub fn post_result(&self, result: DeviceResult) {
        let preview = result.preview(RESULT_PREVIEW_CHARS);
        tracing::debug!("Device posted {} result", result.kind());
        self.slots().result = Some(result);
        self.log.append(format!("Received result: {}", preview));
    }

    /// Take the result, clearing the slot.
    pub fn take_result(&self) -> Option<DeviceResult> {
        self.slots().result.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_poll_delivers_once() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(DeviceCommand::GetStatus);

        assert_eq!(mailbox.device_poll(), Some(DeviceCommand::GetStatus));
        assert_eq!(mailbox.device_poll(), None);
    }

    #[test]
    fn test_poll_empty() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.device_poll(), None);
        // Empty polls are not logged.
        assert!(mailbox.log().is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(DeviceCommand::ScanNetworks);
        mailbox.enqueue(DeviceCommand::Snap);

        assert_eq!(mailbox.device_poll(), Some(DeviceCommand::Snap));
        assert_eq!(mailbox.device_poll(), None);
    }

    #[test]
    fn test_enqueue_clears_stale_result() {
        let mailbox = Mailbox::new();
        mailbox.post_result(DeviceResult::error("late"));
        mailbox.enqueue(DeviceCommand::GetStatus);

        assert_eq!(mailbox.take_result(), None);
        assert_eq!(mailbox.device_poll(), Some(DeviceCommand::GetStatus));
    }

    #[test]
    fn test_result_taken_once() {
        let mailbox = Mailbox::new();
        let body = json!({"connected": true});
        mailbox.post_result(DeviceResult::from_value(body.clone()));
        mailbox.post_result(DeviceResult::from_value(json!({"connected": false})));

        let taken = mailbox.take_result().unwrap();
        assert_eq!(taken.to_value(), json!({"connected": false}));
        assert_eq!(mailbox.take_result(), None);
    }

    #[test]
    fn test_transitions_are_logged() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(DeviceCommand::SetTextKey("sk-secret".to_string()));
        mailbox.device_poll();
        mailbox.post_result(DeviceResult::error("bad key"));

        let messages: Vec<_> = mailbox
            .log()
            .snapshot()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                r#"Received result: {"error":"bad key"}"#.to_string(),
                "Delivered command SET_TEXT_KEY to device".to_string(),
                "Queuing command: SET_TEXT_KEY <redacted>".to_string(),
            ]
        );
    }

    #[test]
    fn test_concurrent_polls_see_command_once() {
        for _ in 0..50 {
            let mailbox = Arc::new(Mailbox::new());
            mailbox.enqueue(DeviceCommand::Solve);

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let mailbox = mailbox.clone();
                    thread::spawn(move || mailbox.device_poll())
                })
                .collect();

            let delivered = handles
                .into_iter()
                .filter_map(|h| h.join().unwrap())
                .count();
            assert_eq!(delivered, 1);
        }
    }
}
