//! HTTP route handlers for the relay.

pub mod device;
pub mod gpt;
pub mod images;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::AppState;

/// Largest accepted request body (JSON or raw image).
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the main Axum router with all routes.
///
/// Routes are organized as:
/// - `/esp32/` - Device mailbox
/// - `/gpt/` - Completion proxy
/// - `/image/` - Image store
/// - anything else - Static files from the public directory
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.public_dir);

    Router::new()
        .nest("/esp32", device::routes())
        .nest("/gpt", gpt::routes())
        .nest("/image", images::routes())
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
