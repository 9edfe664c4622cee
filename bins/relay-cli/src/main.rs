//! Provisioning CLI.
//!
//! Device commands talk to the device's configuration server on the local
//! network. Relay commands talk to the relay server.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use relay_device::{base_url, DeviceClient, WifiStatus};
use relay_protocol::{Ack, CommandRequest, LogsResponse};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "relay-cli", version, about = "Provision the device and drive the relay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the device's WiFi status and IP address
    IpAddress {
        /// Device address, e.g. 192.168.1.100
        device: String,
    },

    /// List networks visible to the device
    WifiScan { device: String },

    /// Connect the device to a network and save the credentials
    WifiPass {
        device: String,
        ssid: String,
        password: String,
    },

    /// Show the device's tunnel URL, replacing it when `url` is given
    NgrokSet { device: String, url: Option<String> },

    /// Queue a command on the relay for the device to pick up
    Queue {
        /// Relay address, e.g. localhost:8080
        server: String,
        command: String,
    },

    /// Print the relay's event log
    Logs { server: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::IpAddress { device } => ip_address(&DeviceClient::new(&device)).await,
        Command::WifiScan { device } => wifi_scan(&DeviceClient::new(&device)).await,
        Command::WifiPass {
            device,
            ssid,
            password,
        } => wifi_pass(&DeviceClient::new(&device), &ssid, &password).await,
        Command::NgrokSet { device, url } => {
            ngrok_set(&DeviceClient::new(&device), url.as_deref()).await
        }
        Command::Queue { server, command } => queue(&base_url(&server), &command).await,
        Command::Logs { server } => logs(&base_url(&server)).await,
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn or_not_connected(ssid: &str) -> &str {
    if ssid.is_empty() {
        "Not connected"
    } else {
        ssid
    }
}

fn print_ota_instructions(status: &WifiStatus) {
    println!("\n📡 OTA Update Instructions:");
    println!("👉 Open browser to: {}", status.ota_url());
    println!("👉 Upload firmware .bin file");
    println!("👉 Device will restart automatically");
}

// ============================================================================
// Device commands
// ============================================================================

async fn ip_address(device: &DeviceClient) -> anyhow::Result<()> {
    let status = device.status().await.context("Failed to get WiFi status")?;

    println!("=== ESP32 WiFi Status ===");
    println!("Connected: {}", yes_no(status.connected));
    println!("IP Address: {}", status.ip_address);
    println!("SSID: {}", or_not_connected(&status.ssid));
    println!("Signal Strength: {} dBm", status.signal_strength);
    println!("==========================");

    if status.is_reachable() {
        print_ota_instructions(&status);
    }
    Ok(())
}

async fn wifi_scan(device: &DeviceClient) -> anyhow::Result<()> {
    let status = device
        .status()
        .await
        .context("Error getting WiFi status")?;
    let networks = device.scan().await.context("Error scanning networks")?;

    println!("=== WiFi Network Scan ===");
    println!("Current IP: {}", status.ip_address);
    println!("Connected: {}", yes_no(status.connected));
    println!("Current SSID: {}", or_not_connected(&status.ssid));
    println!("\nAvailable Networks:");
    if networks.is_empty() {
        println!("  No networks found");
    }
    for (i, network) in networks.iter().enumerate() {
        println!("  {}. {}", i + 1, network);
    }

    println!("\n=== OTA Information ===");
    if status.is_reachable() {
        println!("📡 OTA URL: {}", status.ota_url());
        println!("👉 Upload firmware .bin file to update ESP32");
    } else {
        println!("⚠️  Connect to WiFi first to enable OTA updates");
    }
    println!("========================");
    Ok(())
}

async fn wifi_pass(device: &DeviceClient, ssid: &str, password: &str) -> anyhow::Result<()> {
    if ssid.is_empty() || password.is_empty() {
        bail!("SSID and password are required");
    }

    println!("Connecting to WiFi network: {}", ssid);
    device
        .connect(ssid, password)
        .await
        .context("Error connecting to WiFi")?;
    println!("✅ Connected to WiFi network");

    println!("Saving WiFi credentials...");
    device
        .save(ssid, password)
        .await
        .context("Error saving credentials")?;
    println!("✅ WiFi credentials saved");

    let status = device
        .status()
        .await
        .context("Error getting WiFi status")?;

    println!("\n=== WiFi Connection Successful ===");
    println!("SSID: {}", status.ssid);
    println!("IP Address: {}", status.ip_address);
    println!("Signal Strength: {} dBm", status.signal_strength);
    println!("==================================");
    print_ota_instructions(&status);
    Ok(())
}

async fn ngrok_set(device: &DeviceClient, new_url: Option<&str>) -> anyhow::Result<()> {
    let status = device
        .status()
        .await
        .context("Error getting WiFi status")?;
    let current = device.ngrok_url().await.context("Error getting Ngrok URL")?;

    println!("=== Current Configuration ===");
    println!("ESP32 IP: {}", status.ip_address);
    println!("Connected: {}", yes_no(status.connected));
    println!(
        "Current Ngrok URL: {}",
        if current.is_empty() { "Not set" } else { current.as_str() }
    );
    println!("============================");

    match new_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            println!("Updating Ngrok URL to: {}", url);
            device
                .set_ngrok_url(url)
                .await
                .context("Error setting Ngrok URL")?;
            println!("✅ Ngrok URL updated successfully");
        }
        None => println!("No URL provided, keeping current configuration."),
    }

    let ngrok = device.ngrok_url().await.context("Error getting Ngrok URL")?;
    println!("\n=== Final Configuration ===");
    println!("ESP32 IP: {}", status.ip_address);
    println!("Ngrok URL: {}", ngrok);
    println!("==========================");

    if status.is_reachable() {
        print_ota_instructions(&status);
    }
    Ok(())
}

// ============================================================================
// Relay commands
// ============================================================================

async fn queue(server: &str, command: &str) -> anyhow::Result<()> {
    let body = CommandRequest {
        command: Some(command.to_string()),
    };
    let response = reqwest::Client::new()
        .post(format!("{}/esp32/command", server))
        .json(&body)
        .send()
        .await
        .context("Failed to reach relay")?;

    let status = response.status();
    let ack: Ack = response
        .json()
        .await
        .with_context(|| format!("Unexpected reply from relay ({})", status))?;
    let message = ack.message.unwrap_or_default();
    if !ack.success {
        bail!("{}", message);
    }

    println!("✅ {}", message);
    Ok(())
}

async fn logs(server: &str) -> anyhow::Result<()> {
    let logs: LogsResponse = reqwest::get(format!("{}/esp32/logs", server))
        .await
        .context("Failed to reach relay")?
        .error_for_status()?
        .json()
        .await
        .context("Unexpected reply from relay")?;

    if logs.logs.is_empty() {
        println!("No log entries");
    }
    for entry in logs.logs {
        println!("{}  {}", entry.timestamp.to_rfc3339(), entry.message);
    }
    Ok(())
}
