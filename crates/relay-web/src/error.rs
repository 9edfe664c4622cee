//! Handler errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use relay_protocol::Ack;
use relay_providers::ProviderError;
use thiserror::Error;
use tracing::error;

/// Errors a handler can return.
///
/// Every failure is converted to a response at the handler boundary; none is
/// fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field or parameter is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The request body has a content type the endpoint does not accept.
    #[error("bad content-type: {0}")]
    UnsupportedMedia(String),

    /// A collaborator failed (completion API, image codec, filesystem).
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::UnsupportedMedia(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Upstream(format!("Completion failed: {}", err))
    }
}

impl From<image::ImageError> for ApiError {
    fn from(err: image::ImageError) -> Self {
        ApiError::Upstream(format!("Image processing failed: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Upstream(format!("I/O error: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(message) => (status, Json(Ack::rejected(message))).into_response(),
            ApiError::UnsupportedMedia(_) => {
                (status, self.to_string()).into_response()
            }
            ApiError::Upstream(detail) => {
                error!("{}", detail);
                (status, "Internal Server Error").into_response()
            }
        }
    }
}
