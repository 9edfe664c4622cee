//! Image store routes.
//!
//! Images live as plain files in the images directory. The directory is
//! re-read on every request and sorted by file name, so ids are positions in
//! that order.
//!
//! The calculator screen shows fixed-width text, so `/image/list` returns a
//! page as one string of [`ENTRY_WIDTH`]-character entries.

use std::path::Path;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{error::ApiError, AppState};

/// Entries per page of `/image/list`.
pub const PAGE_SIZE: usize = 4;

/// Width of one `/image/list` entry.
pub const ENTRY_WIDTH: usize = 16;

/// Create image store routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/list", get(list))
        .route("/get", get(get_image))
        .route("/upload", post(upload))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    p: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetQuery {
    id: Option<String>,
}

/// File names in `dir`, sorted.
async fn sorted_names(dir: &Path) -> Result<Vec<String>, ApiError> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// `"<i>:<name>"` cut or padded to [`ENTRY_WIDTH`] characters.
fn format_entry(index: usize, name: &str) -> String {
    let mut entry: String = format!("{}:{}", index, name)
        .chars()
        .take(ENTRY_WIDTH)
        .collect();
    let width = entry.chars().count();
    entry.extend(std::iter::repeat(' ').take(ENTRY_WIDTH - width));
    entry
}

/// Render one page of the listing. A page past the end is empty.
pub fn format_page(names: &[String], page: usize) -> String {
    let Some(start) = page.checked_mul(PAGE_SIZE) else {
        return String::new();
    };
    names
        .iter()
        .skip(start)
        .take(PAGE_SIZE)
        .enumerate()
        .map(|(i, name)| format_entry(i, name))
        .collect()
}

/// GET /image/list?p=<page>
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<String, ApiError> {
    let page = match query.p.as_deref().map(str::trim) {
        None | Some("") => 0,
        Some(p) => p
            .parse::<usize>()
            .map_err(|_| ApiError::validation("Invalid page"))?,
    };
    debug!("Listing image page {}", page);

    let names = sorted_names(&state.images_dir).await?;
    Ok(format_page(&names, page))
}

/// GET /image/get?id=<n>
async fn get_image(
    State(state): State<AppState>,
    Query(query): Query<GetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("bad id"))?
        .parse::<usize>()
        .map_err(|_| ApiError::validation("bad id"))?;

    let names = sorted_names(&state.images_dir).await?;
    let name = names
        .get(id)
        .ok_or_else(|| ApiError::validation("Image id out of range"))?;
    debug!("Serving image {} ({})", id, name);

    let bytes = tokio::fs::read(state.images_dir.join(name)).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

/// POST /image/upload
async fn upload(State(state): State<AppState>, body: Bytes) -> Result<&'static str, ApiError> {
    if body.is_empty() {
        return Err(ApiError::validation("No image data provided"));
    }

    let name = format!("captured_{}.jpg", Utc::now().timestamp_millis());
    tokio::fs::write(state.images_dir.join(&name), &body).await?;
    info!("Image saved: {} ({} bytes)", name, body.len());

    Ok("Image uploaded and processed successfully")
}
