//! Completion proxy routes.
//!
//! The calculator cannot talk to the completion API itself, so it asks the
//! relay. Keys are read from the key store on every call, so an update
//! through `/esp32/set-*-key` applies to the next question.
//!
//! # Endpoints
//!
//! ### `GET /gpt/ask?question=...`
//! Text question. Answers in plain text.
//!
//! ### `POST /gpt/solve?n=...`
//! Raw `image/jpg` body of a photographed question.
//!
//! ### `POST /gpt/vision`
//! `{image, question}` where `image` is base64.

use std::io::Cursor;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap},
    response::Json,
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use relay_protocol::{required, VisionRequest};
use relay_providers::{CompletionRequest, ImageAttachment};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{error::ApiError, AppState};

const STUDENT_PROMPT: &str = "You are answering questions for students. \
Keep responses under 100 characters and only answer using uppercase letters.";

const TUTOR_PROMPT: &str = "You are a helpful math tutor, specifically designed to help \
with basic arithmetic, but also can answer a broad range of math questions from uploaded \
images. You should provide answers as succinctly as possible, and always under 100 \
characters. Be as accurate as possible.";

const VISION_PROMPT: &str = "You are answering questions about an image for students. \
Keep responses under 100 characters and only answer using uppercase letters.";

const ANSWER_INSTRUCTIONS: &str =
    " Do not explain how you found the answer. If the question is multiple-choice, give the letter answer.";

/// Body sent when the model returns no content.
pub const NO_RESPONSE: &str = "no response";

/// Content types accepted by `/gpt/solve`.
const JPEG_TYPES: [&str; 2] = ["image/jpg", "image/jpeg"];

/// Create completion proxy routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ask", get(ask))
        .route("/solve", post(solve))
        .route("/vision", post(vision))
}

#[derive(Debug, Deserialize)]
struct AskQuery {
    question: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SolveQuery {
    n: Option<String>,
}

async fn complete(state: &AppState, request: CompletionRequest) -> Result<String, ApiError> {
    let answer = state.completions.complete(request).await?;
    Ok(answer.unwrap_or_else(|| NO_RESPONSE.to_string()))
}

/// GET /gpt/ask
async fn ask(
    State(state): State<AppState>,
    Query(query): Query<AskQuery>,
) -> Result<String, ApiError> {
    let request = CompletionRequest {
        model: state.models.text_model.clone(),
        api_key: state.keys.text_key(),
        system: STUDENT_PROMPT.to_string(),
        prompt: query.question.unwrap_or_default(),
        image: None,
    };
    complete(&state, request).await
}

/// Prompt for a photographed question, optionally numbered.
pub fn solve_prompt(question_number: Option<&str>) -> String {
    let question = match question_number.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => format!("What is the answer to question {}?", n),
        None => "What is the answer to this question?".to_string(),
    };
    format!("{}{}", question, ANSWER_INSTRUCTIONS)
}

/// Decode an uploaded image and re-encode it as base64 JPEG.
fn reencode_jpeg(bytes: &[u8]) -> Result<String, ApiError> {
    let decoded = image::load_from_memory(bytes)?;
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut jpeg = Cursor::new(Vec::new());
    rgb.write_to(&mut jpeg, ImageFormat::Jpeg)?;
    Ok(STANDARD.encode(jpeg.into_inner()))
}

fn is_jpeg(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    JPEG_TYPES.iter().any(|t| mime.eq_ignore_ascii_case(t))
}

/// POST /gpt/solve
async fn solve(
    State(state): State<AppState>,
    Query(query): Query<SolveQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<String, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");
    debug!("Solve request with content-type {}", content_type);
    if !is_jpeg(content_type) {
        return Err(ApiError::UnsupportedMedia(content_type.to_string()));
    }

    let encoded = reencode_jpeg(&body)?;
    debug!("Encoded image: {} bytes", encoded.len());

    let prompt = solve_prompt(query.n.as_deref());
    info!("Solve prompt: {}", prompt);

    let request = CompletionRequest {
        model: state.models.vision_model.clone(),
        api_key: state.keys.image_key(),
        system: TUTOR_PROMPT.to_string(),
        prompt,
        image: Some(ImageAttachment::jpeg(encoded)),
    };
    complete(&state, request).await
}

/// POST /gpt/vision
async fn vision(
    State(state): State<AppState>,
    body: Option<Json<VisionRequest>>,
) -> Result<String, ApiError> {
    let Json(req) = body.ok_or_else(|| ApiError::validation("No image provided"))?;
    let image = required(req.image).ok_or_else(|| ApiError::validation("No image provided"))?;
    let question =
        required(req.question).ok_or_else(|| ApiError::validation("No question provided"))?;

    let bytes = STANDARD
        .decode(&image)
        .map_err(|_| ApiError::validation("Image is not valid base64"))?;
    let format = image::guess_format(&bytes)
        .map_err(|_| ApiError::validation("Image format not recognized"))?;

    let request = CompletionRequest {
        model: state.models.vision_model.clone(),
        api_key: state.keys.image_key(),
        system: VISION_PROMPT.to_string(),
        prompt: question,
        image: Some(ImageAttachment {
            mime: format.to_mime_type().to_string(),
            base64: image,
        }),
    };
    complete(&state, request).await
}
