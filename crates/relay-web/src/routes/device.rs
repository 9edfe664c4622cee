//! Device mailbox routes.
//!
//! # Endpoints
//!
//! ## Device-facing
//!
//! These never wait.
//!
//! ### `GET /esp32/poll`
//! Returns the pending command as plain text, or `NO_OP`.
//!
//! ### `POST /esp32/result`
//! Stores the JSON result body and wakes a waiting operator request.
//!
//! ## Operator-facing
//!
//! ### `GET /esp32/scan`, `/status`, `/snap`, `/solve`
//! Queue the matching command and wait for the device to answer. A request
//! the device does not answer in time gets `{"error": "Command timed out"}`
//! with status 200.
//!
//! ### `POST /esp32/command`
//! Queue an arbitrary `{command}` without waiting.
//!
//! ### `POST /esp32/ngrok/set`, `/text-key/set`, `/image-key/set`
//! Queue a parameterized command for the device without waiting.
//!
//! ### `POST /esp32/set-text-key`, `/set-image-key`
//! Replace the server's own API key directly.
//!
//! ### `GET /esp32/logs`
//! The event log, newest first.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use relay_core::{DeviceCommand, DeviceResult, KeyKind};
use relay_protocol::{
    decode_result, required, timeout_result, Ack, CommandRequest, KeyRequest, LogsResponse,
    NgrokRequest,
};
use tracing::{debug, warn};

use crate::{error::ApiError, AppState};

/// Create device mailbox routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/poll", get(poll))
        .route("/result", post(post_result))
        .route("/scan", get(scan))
        .route("/status", get(status))
        .route("/snap", get(snap))
        .route("/solve", get(solve))
        .route("/command", post(queue_command))
        .route("/logs", get(logs))
        .route("/ngrok/set", post(set_ngrok))
        .route("/set-text-key", post(set_text_key))
        .route("/set-image-key", post(set_image_key))
        .route("/text-key/set", post(queue_text_key))
        .route("/image-key/set", post(queue_image_key))
}

// ============================================================================
// Device-facing
// ============================================================================

/// GET /esp32/poll
async fn poll(State(state): State<AppState>) -> String {
    state.relay.poll().encode()
}

/// POST /esp32/result
async fn post_result(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let result = decode_result(&body).map_err(|e| {
        warn!("Rejected device result: {}", e);
        ApiError::validation(e.to_string())
    })?;
    state.relay.post_result(result);
    Ok(StatusCode::OK)
}

// ============================================================================
// Operator-facing, waiting
// ============================================================================

async fn request(state: &AppState, command: DeviceCommand) -> Json<DeviceResult> {
    let outcome = state.relay.request(command).await;
    Json(outcome.into_result().unwrap_or_else(timeout_result))
}

/// GET /esp32/scan
async fn scan(State(state): State<AppState>) -> Json<DeviceResult> {
    request(&state, DeviceCommand::ScanNetworks).await
}

/// GET /esp32/status
async fn status(State(state): State<AppState>) -> Json<DeviceResult> {
    request(&state, DeviceCommand::GetStatus).await
}

/// GET /esp32/snap
async fn snap(State(state): State<AppState>) -> Json<DeviceResult> {
    request(&state, DeviceCommand::Snap).await
}

/// GET /esp32/solve
async fn solve(State(state): State<AppState>) -> Json<DeviceResult> {
    request(&state, DeviceCommand::Solve).await
}

// ============================================================================
// Operator-facing, queued
// ============================================================================

/// POST /esp32/command
///
/// A missing or unparsable body is a validation error, like a missing field.
async fn queue_command(
    State(state): State<AppState>,
    body: Option<Json<CommandRequest>>,
) -> Result<Json<Ack>, ApiError> {
    let raw = body
        .and_then(|Json(req)| required(req.command))
        .ok_or_else(|| ApiError::validation("No command provided"))?;
    let command: DeviceCommand = raw
        .parse()
        .map_err(|_| ApiError::validation("No command provided"))?;

    let message = format!("Command {} queued", command.redacted());
    state.relay.queue(command);
    Ok(Json(Ack::ok_with(message)))
}

/// GET /esp32/logs
async fn logs(State(state): State<AppState>) -> Json<LogsResponse> {
    Json(LogsResponse {
        logs: state.relay.log().snapshot(),
    })
}

/// POST /esp32/ngrok/set
async fn set_ngrok(
    State(state): State<AppState>,
    body: Option<Json<NgrokRequest>>,
) -> Result<Json<Ack>, ApiError> {
    let url = body
        .and_then(|Json(req)| required(req.url))
        .ok_or_else(|| ApiError::validation("No URL provided"))?;

    state
        .relay
        .log()
        .append(format!("Requested Ngrok URL update to: {}", url));
    state.relay.queue(DeviceCommand::SetNgrok(url));
    Ok(Json(Ack::ok_with("Ngrok update command queued")))
}

fn key_from(body: Option<Json<KeyRequest>>) -> Result<String, ApiError> {
    body.and_then(|Json(req)| required(req.key))
        .ok_or_else(|| ApiError::validation("No key provided"))
}

fn update_key(
    state: &AppState,
    kind: KeyKind,
    body: Option<Json<KeyRequest>>,
) -> Result<Json<Ack>, ApiError> {
    let key = key_from(body)?;
    state.keys.set(kind, key);
    state
        .relay
        .log()
        .append(format!("{} API key updated", kind.label()));
    Ok(Json(Ack::ok()))
}

/// POST /esp32/set-text-key
async fn set_text_key(
    State(state): State<AppState>,
    body: Option<Json<KeyRequest>>,
) -> Result<Json<Ack>, ApiError> {
    update_key(&state, KeyKind::Text, body)
}

/// POST /esp32/set-image-key
async fn set_image_key(
    State(state): State<AppState>,
    body: Option<Json<KeyRequest>>,
) -> Result<Json<Ack>, ApiError> {
    update_key(&state, KeyKind::Image, body)
}

/// POST /esp32/text-key/set
async fn queue_text_key(
    State(state): State<AppState>,
    body: Option<Json<KeyRequest>>,
) -> Result<Json<Ack>, ApiError> {
    let key = key_from(body)?;
    debug!("Forwarding text key to device");
    state.relay.queue(DeviceCommand::SetTextKey(key));
    Ok(Json(Ack::ok_with("Text key update command queued")))
}

/// POST /esp32/image-key/set
async fn queue_image_key(
    State(state): State<AppState>,
    body: Option<Json<KeyRequest>>,
) -> Result<Json<Ack>, ApiError> {
    let key = key_from(body)?;
    debug!("Forwarding image key to device");
    state.relay.queue(DeviceCommand::SetImageKey(key));
    Ok(Json(Ack::ok_with("Image key update command queued")))
}
