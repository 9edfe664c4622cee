//! # relay-providers
//!
//! Large-language-model completion providers used by the relay's `/gpt`
//! routes.
//!
//! The relay only needs one operation: send a system prompt, a user prompt
//! and optionally an image, and get free text back. [`CompletionProvider`]
//! is that seam; [`OpenRouterClient`] implements it against any
//! OpenAI-compatible chat completions API.

pub mod completion;
pub mod openrouter;

pub use completion::{CompletionProvider, CompletionRequest, ImageAttachment, ProviderError};
pub use openrouter::OpenRouterClient;
