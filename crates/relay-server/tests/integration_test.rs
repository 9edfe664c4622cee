//! Integration tests for the operator/device rendezvous.
//!
//! These tests run a simulated device on its own task that polls the relay
//! on a fixed interval and answers commands, while the test body plays the
//! operator. Time is paused so timeouts are exact.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use relay_protocol::PollResponse;
use relay_server::{DeviceCommand, DeviceResult, Relay, WaitOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Start a simulated device that answers every command it receives after
/// `think_time`, and reports each command it saw on the returned channel.
fn start_device(
    relay: Arc<Relay>,
    think_time: Duration,
) -> (mpsc::UnboundedReceiver<String>, JoinHandle<()>) {
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut interval = time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;

            let command = match relay.poll() {
                PollResponse::Command(command) => command,
                PollResponse::NoOp => continue,
            };
            let _ = seen_tx.send(command.wire());

            time::sleep(think_time).await;
            relay.post_result(answer(&command));
        }
    });

    (seen_rx, handle)
}

/// What the simulated firmware replies with.
fn answer(command: &DeviceCommand) -> DeviceResult {
    let body = match command {
        DeviceCommand::GetStatus => json!({
            "connected": true,
            "ipAddress": "192.168.1.100",
            "ssid": "TestNetwork",
            "signalStrength": -45
        }),
        DeviceCommand::ScanNetworks => json!({
            "networks": ["TestNetwork", "GuestNetwork", "NeighborWiFi"]
        }),
        DeviceCommand::Solve => json!({"answer": "42"}),
        other => json!({"ack": other.verb()}),
    };
    DeviceResult::from_value(body)
}

#[tokio::test(start_paused = true)]
async fn test_status_round_trip() {
    let relay = Arc::new(Relay::new(Duration::from_secs(30)));
    let (mut seen, device) = start_device(relay.clone(), Duration::from_millis(200));

    let outcome = relay.request(DeviceCommand::GetStatus).await;

    match outcome {
        WaitOutcome::Delivered(DeviceResult::Status(status)) => {
            assert!(status.connected);
            assert_eq!(status.ip_address(), Some("192.168.1.100"));
        }
        other => panic!("Expected status result, got {:?}", other),
    }
    assert_eq!(seen.recv().await.as_deref(), Some("GET_STATUS"));

    device.abort();
}

#[tokio::test(start_paused = true)]
async fn test_sequential_requests_get_their_own_results() {
    let relay = Arc::new(Relay::new(Duration::from_secs(30)));
    let (_seen, device) = start_device(relay.clone(), Duration::from_millis(100));

    let scan = relay.request(DeviceCommand::ScanNetworks).await;
    let solve = relay.request(DeviceCommand::Solve).await;

    assert_eq!(scan.into_result().unwrap().kind(), "scan");
    assert_eq!(
        solve.into_result().unwrap().to_value(),
        json!({"answer": "42"})
    );

    device.abort();
}

#[tokio::test(start_paused = true)]
async fn test_timeout_when_device_is_offline() {
    let relay = Relay::new(Duration::from_secs(30));
    let start = Instant::now();

    let outcome = relay.request(DeviceCommand::ScanNetworks).await;

    assert!(outcome.is_timed_out());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(30));
    assert!(elapsed < Duration::from_secs(30) + POLL_INTERVAL);

    // The command is still waiting for the device.
    assert_eq!(relay.poll(), PollResponse::Command(DeviceCommand::ScanNetworks));
}

#[tokio::test(start_paused = true)]
async fn test_slow_device_times_out_then_leaks_result() {
    let relay = Arc::new(Relay::new(Duration::from_secs(1)));
    let (_seen, device) = start_device(relay.clone(), Duration::from_secs(5));

    let first = relay.request(DeviceCommand::Snap).await;
    assert!(first.is_timed_out());

    // Let the device finish answering the abandoned command.
    time::sleep(Duration::from_secs(10)).await;

    // Nothing ties the late result to the request that produced it: a bare
    // wait picks it up.
    let leaked = relay.await_result(Duration::from_millis(1)).await;
    assert_eq!(
        leaked.into_result().unwrap().to_value(),
        json!({"ack": "SNAP"})
    );

    device.abort();
}

#[tokio::test(start_paused = true)]
async fn test_device_endpoints_stay_responsive_while_operator_waits() {
    let relay = Arc::new(Relay::new(Duration::from_secs(30)));

    let operator = {
        let relay = relay.clone();
        tokio::spawn(async move { relay.request(DeviceCommand::GetStatus).await })
    };
    tokio::task::yield_now().await;

    // The operator is parked; device calls return immediately.
    assert_eq!(
        relay.poll(),
        PollResponse::Command(DeviceCommand::GetStatus)
    );
    assert_eq!(relay.poll(), PollResponse::NoOp);
    relay.post_result(DeviceResult::from_value(json!({"connected": false})));

    let outcome = operator.await.unwrap();
    assert_eq!(
        outcome.into_result().unwrap().to_value(),
        json!({"connected": false})
    );
}

#[tokio::test(start_paused = true)]
async fn test_fire_and_forget_commands_are_last_write_wins() {
    let relay = Arc::new(Relay::new(Duration::from_secs(30)));

    relay.queue(DeviceCommand::SetNgrok("https://old.ngrok-free.app".to_string()));
    relay.queue(DeviceCommand::SetNgrok("https://new.ngrok-free.app".to_string()));

    let (mut seen, device) = start_device(relay.clone(), Duration::ZERO);
    assert_eq!(
        seen.recv().await.as_deref(),
        Some("SET_NGROK https://new.ngrok-free.app")
    );

    time::sleep(POLL_INTERVAL * 4).await;
    assert!(seen.try_recv().is_err());

    device.abort();
}
