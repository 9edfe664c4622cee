//! OpenAI-compatible chat completions client.
//!
//! Talks to `POST {base_url}/chat/completions` with bearer authentication.
//! The API key travels with each request so runtime key updates take effect
//! on the next call.

use async_trait::async_trait;
use relay_core::ModelConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completion::{CompletionProvider, CompletionRequest, ProviderError};

const REFERER: &str = "https://github.com/chromalock/TI-32";
const TITLE: &str = "TI-32 Calculator Mod";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for OpenRouter or any OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(models: &ModelConfig) -> Self {
        Self::new(&models.api_base_url)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn build_body(request: &CompletionRequest) -> ChatRequest<'_> {
    let user = match &request.image {
        None => MessageContent::Text(&request.prompt),
        Some(image) => MessageContent::Parts(vec![
            ContentPart::Text {
                text: &request.prompt,
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                    detail: "auto",
                },
            },
        ]),
    };

    ChatRequest {
        model: &request.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(&request.system),
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ],
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, ProviderError> {
        if request.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        debug!(
            "Requesting completion from {} (image: {})",
            request.model,
            request.image.is_some()
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&request.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&build_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Completion API returned {}", status);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content))
    }
}
