//! Shared helpers for HTTP surface tests.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use relay_core::RelayConfig;
use relay_providers::{CompletionProvider, CompletionRequest, ProviderError};
use relay_web::{create_router, AppState, ServerState};
use tower::ServiceExt;

/// Completion provider that records requests and answers with a fixed reply.
#[derive(Default)]
pub struct RecordingProvider {
    pub reply: Option<String>,
    pub fail: bool,
    pub seen: Mutex<Vec<CompletionRequest>>,
}

impl RecordingProvider {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, ProviderError> {
        self.seen.lock().unwrap().push(request);
        if self.fail {
            return Err(ProviderError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self.reply.clone())
    }
}

pub fn config(images_dir: &Path) -> RelayConfig {
    RelayConfig {
        command_timeout: Duration::from_secs(30),
        images_dir: images_dir.to_path_buf(),
        public_dir: images_dir.join("public"),
        text_key: "text-initial".to_string(),
        image_key: "image-initial".to_string(),
        ..Default::default()
    }
}

pub fn state_with(images_dir: &Path, provider: Arc<RecordingProvider>) -> AppState {
    Arc::new(ServerState::new(&config(images_dir), provider))
}

pub async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let app: Router = create_router(state.clone());
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

pub async fn get(state: &AppState, uri: &str) -> (StatusCode, Vec<u8>) {
    send(state, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(state: &AppState, uri: &str, json: serde_json::Value) -> (StatusCode, Vec<u8>) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    send(state, request).await
}

pub fn text(body: &[u8]) -> String {
    String::from_utf8(body.to_vec()).unwrap()
}

pub fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}
