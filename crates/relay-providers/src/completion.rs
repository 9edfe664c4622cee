//! Completion provider abstraction.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while requesting a completion.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key is configured for the requested model.
    #[error("No API key configured")]
    MissingApiKey,

    /// The HTTP request failed.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Completion API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// An image sent along with the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// MIME type, e.g. `image/jpeg`.
    pub mime: String,
    /// Base64-encoded image bytes.
    pub base64: String,
}

impl ImageAttachment {
    pub fn jpeg(base64: impl Into<String>) -> Self {
        Self {
            mime: "image/jpeg".to_string(),
            base64: base64.into(),
        }
    }

    /// `data:` URL form accepted by vision models.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub api_key: String,
    pub system: String,
    pub prompt: String,
    pub image: Option<ImageAttachment>,
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run the completion. `Ok(None)` means the model returned no content.
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, ProviderError>;
}
