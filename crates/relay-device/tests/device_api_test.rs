//! Integration tests for the device API client.
//!
//! These tests start a mock device on a local port that answers like the
//! firmware's configuration server and drive it through [`DeviceClient`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    response::Json,
    routing::get,
    Form, Router,
};
use serde_json::{json, Value};

use relay_device::{DeviceClient, DeviceError};

#[derive(Default)]
struct MockDevice {
    ngrok_url: Mutex<String>,
    saved: Mutex<Option<(String, String)>>,
    fail_scan: bool,
}

type Shared = Arc<MockDevice>;

fn envelope(message: &str, data: Option<Value>) -> Json<Value> {
    let mut body = json!({"success": true, "message": message});
    if let Some(data) = data {
        body["data"] = Value::String(data.to_string());
    }
    Json(body)
}

async fn wifi_status() -> Json<Value> {
    envelope(
        "WiFi status retrieved",
        Some(json!({
            "connected": true,
            "ipAddress": "192.168.1.100",
            "ssid": "TestNetwork",
            "signalStrength": -45
        })),
    )
}

async fn wifi_scan(State(device): State<Shared>) -> Json<Value> {
    if device.fail_scan {
        return Json(json!({"success": false, "message": "Scan failed"}));
    }
    envelope(
        "WiFi scan completed",
        Some(json!({"networks": ["TestNetwork", "GuestNetwork", "NeighborWiFi"]})),
    )
}

async fn wifi_connect(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    if form.get("ssid").map_or(true, |s| s.is_empty()) {
        return Json(json!({"success": false, "message": "SSID required"}));
    }
    envelope("Connected to WiFi network", None)
}

async fn wifi_save(
    State(device): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let ssid = form.get("ssid").cloned().unwrap_or_default();
    let password = form.get("password").cloned().unwrap_or_default();
    *device.saved.lock().unwrap() = Some((ssid, password));
    envelope("WiFi credentials saved successfully", None)
}

async fn get_ngrok(State(device): State<Shared>) -> Json<Value> {
    let url = device.ngrok_url.lock().unwrap().clone();
    envelope("Ngrok URL retrieved", Some(json!({"ngrokUrl": url})))
}

async fn set_ngrok(
    State(device): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    *device.ngrok_url.lock().unwrap() = form.get("url").cloned().unwrap_or_default();
    envelope("Ngrok URL saved successfully", None)
}

/// Start a mock device and return its address.
async fn start_mock_device(device: MockDevice) -> (SocketAddr, Shared) {
    let device = Arc::new(device);
    let app = Router::new()
        .route("/wifi/status", get(wifi_status))
        .route("/wifi/scan", get(wifi_scan))
        .route("/wifi/connect", axum::routing::post(wifi_connect))
        .route("/wifi/save", axum::routing::post(wifi_save))
        .route("/ngrok/url", get(get_ngrok).post(set_ngrok))
        .with_state(device.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, device)
}

#[tokio::test]
async fn test_status() {
    let (addr, _device) = start_mock_device(MockDevice::default()).await;
    let client = DeviceClient::new(&addr.to_string());

    let status = client.status().await.unwrap();
    assert!(status.connected);
    assert_eq!(status.ip_address, "192.168.1.100");
    assert_eq!(status.ssid, "TestNetwork");
    assert_eq!(status.signal_strength, -45);
    assert!(status.is_reachable());
}

#[tokio::test]
async fn test_scan() {
    let (addr, _device) = start_mock_device(MockDevice::default()).await;
    let client = DeviceClient::new(&addr.to_string());

    let networks = client.scan().await.unwrap();
    assert_eq!(networks, vec!["TestNetwork", "GuestNetwork", "NeighborWiFi"]);
}

#[tokio::test]
async fn test_scan_rejected() {
    let (addr, _device) = start_mock_device(MockDevice {
        fail_scan: true,
        ..Default::default()
    })
    .await;
    let client = DeviceClient::new(&addr.to_string());

    match client.scan().await {
        Err(DeviceError::Rejected(message)) => assert_eq!(message, "Scan failed"),
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connect_and_save_credentials() {
    let (addr, device) = start_mock_device(MockDevice::default()).await;
    let client = DeviceClient::new(&format!("http://{}", addr));

    let message = client.connect("TestNetwork", "p@ss word&1").await.unwrap();
    assert_eq!(message, "Connected to WiFi network");

    client.save("TestNetwork", "p@ss word&1").await.unwrap();
    assert_eq!(
        device.saved.lock().unwrap().clone(),
        Some(("TestNetwork".to_string(), "p@ss word&1".to_string()))
    );
}

#[tokio::test]
async fn test_ngrok_get_and_set() {
    let (addr, _device) = start_mock_device(MockDevice::default()).await;
    let client = DeviceClient::new(&addr.to_string());

    assert_eq!(client.ngrok_url().await.unwrap(), "");

    client
        .set_ngrok_url("https://new-url.ngrok-free.app")
        .await
        .unwrap();
    assert_eq!(
        client.ngrok_url().await.unwrap(),
        "https://new-url.ngrok-free.app"
    );
}

#[tokio::test]
async fn test_unreachable_device() {
    // Bind and drop to get a port nobody listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = DeviceClient::new(&addr.to_string());

    assert!(matches!(client.status().await, Err(DeviceError::Http(_))));
}
