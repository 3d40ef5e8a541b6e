use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info_span, instrument, trace, Instrument};

use crate::{
    config::ClientConfig,
    models::{
        base::Message,
        chat::{ChatOptions, ChatRequest, ChatResponse, ChatStreamChunk},
        errors::ClientError,
    },
    util::truncate_for_log,
};

/// Default address of the local model service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
/// Default capability-lookup endpoint; the base model name is appended.
pub const DEFAULT_LIBRARY_URL: &str = "https://ollama.com/library";

/// How long (seconds) `load_model` asks the service to keep a model warm.
pub const DEFAULT_LOAD_KEEP_ALIVE: u64 = 300;

/// The main client for interacting with the model service.
///
/// Cloning is cheap; clones share the underlying connection pool and the
/// capability cache.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    pub client: Client,
    pub base_url: String,
    pub library_url: String,
    pub(crate) capabilities: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaClient {
    /// Creates a client with default endpoints.
    pub fn new() -> Self {
        OllamaClient {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.into(),
            library_url: DEFAULT_LIBRARY_URL.into(),
            capabilities: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a client from a [`ClientConfig`].
    pub fn from_config(cfg: ClientConfig) -> Result<Self, ClientError> {
        let mut default_headers = HeaderMap::new();
        if let Some(headers) = cfg.extra_headers {
            for (name, value) in headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| ClientError::Config(format!("invalid header name {name}: {e}")))?;
                let value = HeaderValue::from_str(&value)
                    .map_err(|e| ClientError::Config(format!("invalid header value: {e}")))?;
                default_headers.insert(name, value);
            }
        }

        let client = Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(OllamaClient {
            client,
            base_url: cfg.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            library_url: cfg.library_url.unwrap_or_else(|| DEFAULT_LIBRARY_URL.into()),
            capabilities: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub(crate) fn capability_cache(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        match self.capabilities.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Executes a POST request against the service and deserializes the
    /// response body.
    #[instrument(name = "client.post", skip_all, fields(endpoint = %endpoint))]
    pub(crate) async fn post<T, R>(&self, endpoint: &str, request_body: &T) -> Result<R, ClientError>
    where
        T: serde::Serialize + fmt::Debug,
        R: DeserializeOwned + fmt::Debug,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let span = info_span!("http.request", %url);
        async {
            let response = self
                .client
                .post(&url)
                .json(request_body)
                .send()
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to dispatch request");
                    ClientError::Send(e.to_string())
                })?;

            let status = response.status();
            debug!(%status, "received response");

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error body".into());

                error!(%status, body = %truncate_for_log(&error_text, 2048), "request failed");

                return Err(ClientError::Api(format!(
                    "Request failed: {status} - {error_text}"
                )));
            }

            let response_text = response
                .text()
                .await
                .map_err(|e| ClientError::Parse(format!("Failed to read response text: {e}")))?;

            match serde_json::from_str::<R>(&response_text) {
                Ok(parsed) => {
                    trace!(?parsed, "deserialized response");
                    Ok(parsed)
                }
                Err(e) => {
                    error!(%e, raw = %truncate_for_log(&response_text, 2048), "deserialization error");
                    Err(ClientError::Parse(format!(
                        "Error decoding response body: {e}"
                    )))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Executes a GET request against an absolute URL and deserializes the
    /// response body.
    #[instrument(name = "client.get", skip_all, fields(url = %url))]
    pub(crate) async fn get<R>(&self, url: &str) -> Result<R, ClientError>
    where
        R: DeserializeOwned + fmt::Debug,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "failed to dispatch request");
                ClientError::Send(e.to_string())
            })?;

        let status = response.status();
        debug!(%status, "received response");

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".into());

            error!(%status, body = %truncate_for_log(&error_text, 2048), "request failed");

            return Err(ClientError::Api(format!(
                "Request failed: {status} - {error_text}"
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ClientError::Parse(format!("Failed to read response text: {e}")))?;

        match serde_json::from_str::<R>(&response_text) {
            Ok(parsed) => {
                trace!(?parsed, "deserialized response");
                Ok(parsed)
            }
            Err(e) => {
                error!(%e, raw = %truncate_for_log(&response_text, 2048), "deserialization error");
                Err(ClientError::Parse(format!(
                    "Error decoding response body: {e}"
                )))
            }
        }
    }

    async fn post_stream<T, R>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<impl Stream<Item = Result<R, ClientError>> + Send + 'static, ClientError>
    where
        T: serde::Serialize + fmt::Debug,
        R: DeserializeOwned + fmt::Debug + Send + 'static,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Send(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Api(format!("Request failed: {status}")));
        }

        let byte_stream = resp.bytes_stream();

        Ok(try_stream! {
            let mut buf = Vec::<u8>::new();
            tokio::pin!(byte_stream);

            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk.map_err(|e| ClientError::Send(e.to_string()))?;
                buf.extend_from_slice(&chunk);

                // the service sends \n-terminated JSON lines
                while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    let line = &line[..line.len() - 1];

                    if line.is_empty() {
                        continue;
                    }

                    let parsed: R = serde_json::from_slice(line)
                        .map_err(|e| ClientError::Parse(e.to_string()))?;

                    yield parsed;
                }
            }
        })
    }

    /// Sends one chat round-trip and returns the full wire response.
    pub async fn chat_response(&self, request: ChatRequest) -> Result<ChatResponse, ClientError> {
        self.post("/api/chat", &request).await
    }

    /// Sends one chat round-trip and returns the assistant reply.
    ///
    /// The caller's message slice is never modified.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<Message, ClientError> {
        let request = ChatRequest::from_options(model, messages.to_vec(), options);
        let response = self.chat_response(request).await?;
        Ok(response.message)
    }

    /// Like [`OllamaClient::chat`], but returns the extended conversation:
    /// a fresh copy of the input messages with the reply appended.
    pub async fn chat_with_history(
        &self,
        model: &str,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<Vec<Message>, ClientError> {
        let reply = self.chat(model, messages, options).await?;
        let mut conversation = messages.to_vec();
        conversation.push(reply);
        Ok(conversation)
    }

    /// Sends one chat round-trip in streaming mode.
    ///
    /// The `stream` flag in `options` is overridden; chunks arrive as
    /// newline-delimited JSON and are decoded incrementally.
    pub async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<impl Stream<Item = Result<ChatStreamChunk, ClientError>> + Send + 'static, ClientError>
    {
        let mut request = ChatRequest::from_options(model, messages.to_vec(), options);
        request.stream = true;
        self.post_stream("/api/chat", &request).await
    }

    /// Asks the service to load a model into memory, keeping it resident
    /// for [`DEFAULT_LOAD_KEEP_ALIVE`] seconds.
    pub async fn load_model(&self, model: &str) -> Result<(), ClientError> {
        self.load_model_for(model, DEFAULT_LOAD_KEEP_ALIVE).await
    }

    /// Asks the service to load a model and keep it resident for the given
    /// number of seconds. A chat request with no messages only touches
    /// model residency; the reply carries no content and is discarded.
    pub async fn load_model_for(&self, model: &str, keep_alive_secs: u64) -> Result<(), ClientError> {
        let options = ChatOptions::new().keep_alive(keep_alive_secs);
        let request = ChatRequest::from_options(model, Vec::new(), options);
        let _: ChatResponse = self.post("/api/chat", &request).await?;
        Ok(())
    }

    /// Asks the service to evict a model immediately (keep_alive 0).
    ///
    /// There is no confirmation beyond the HTTP status.
    pub async fn unload_model(&self, model: &str) -> Result<(), ClientError> {
        self.load_model_for(model, 0).await
    }
}
