//! Notification-based wait gate.
//!
//! A waiter repeatedly checks some shared state and sleeps on a
//! [`Notify`] between checks. Whoever changes that state calls
//! [`WaitGate::open`], which wakes one waiter. The wait is bounded by a
//! deadline; expiry is reported as `None`, not as an error.
//!
//! Only the waiting task is suspended. Producers never block on the gate.

use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, Instant};

#[derive(Debug, Default)]
pub struct WaitGate {
    signal: Notify,
}

impl WaitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake one waiter.
    ///
    /// If nobody is waiting the wakeup is remembered and the next waiter
    /// re-checks immediately.
    pub fn open(&self) {
        self.signal.notify_one();
    }

    /// Wait until `check` yields a value or `timeout` elapses.
    ///
    /// `check` runs once up front, after every wakeup, and once more at the
    /// deadline so a value that lands exactly at expiry is not lost.
    pub async fn wait_for<T, F>(&self, timeout: Duration, mut check: F) -> Option<T>
    where
        F: FnMut() -> Option<T>,
    {
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before checking so an `open` between the check
            // and the await is not missed.
            let notified = self.signal.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = check() {
                return Some(value);
            }

            if time::timeout_at(deadline, notified).await.is_err() {
                return check();
            }
        }
    }
}
