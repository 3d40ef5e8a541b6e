use std::collections::HashMap;

use crate::{client::OllamaClient, ClientError};

/// Configuration for an [`OllamaClient`].
///
/// Every field is optional; unset fields fall back to the client defaults
/// (`http://127.0.0.1:11434` for the service, `https://ollama.com/library`
/// for capability lookups).
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub library_url: Option<String>,
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ClientConfig {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn library_url(mut self, library_url: impl Into<String>) -> Self {
        self.library_url = Some(library_url.into());
        self
    }

    pub fn extra_headers(mut self, extra_headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(extra_headers);
        self
    }

    pub fn build(self) -> Result<OllamaClient, ClientError> {
        OllamaClient::from_config(self)
    }
}
