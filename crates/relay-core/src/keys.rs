//! Process-wide API key store.
//!
//! Holds the key used for text completions and the key used for image
//! completions. Both start from configuration and can be replaced at runtime;
//! readers always see the latest value.

use std::sync::{PoisonError, RwLock};

/// Which key slot to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Text,
    Image,
}

impl KeyKind {
    pub fn label(self) -> &'static str {
        match self {
            KeyKind::Text => "Text",
            KeyKind::Image => "Image",
        }
    }
}

#[derive(Debug, Default)]
pub struct KeyStore {
    text: RwLock<String>,
    image: RwLock<String>,
}

impl KeyStore {
    pub fn new(text_key: impl Into<String>, image_key: impl Into<String>) -> Self {
        tracing::info!("Key store initialized");
        Self {
            text: RwLock::new(text_key.into()),
            image: RwLock::new(image_key.into()),
        }
    }

    fn slot(&self, kind: KeyKind) -> &RwLock<String> {
        match kind {
            KeyKind::Text => &self.text,
            KeyKind::Image => &self.image,
        }
    }

    pub fn get(&self, kind: KeyKind) -> String {
        self.slot(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, kind: KeyKind, key: impl Into<String>) {
        *self
            .slot(kind)
            .write()
            .unwrap_or_else(PoisonError::into_inner) = key.into();
        tracing::info!("{} API key updated", kind.label());
    }

    pub fn text_key(&self) -> String {
        self.get(KeyKind::Text)
    }

    pub fn image_key(&self) -> String {
        self.get(KeyKind::Image)
    }
}
