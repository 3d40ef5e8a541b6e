use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{tools::Tool, Message};

/// Optional per-call parameters for a chat round-trip.
///
/// Anything not covered by a named field can be supplied through `extra`
/// and is merged into the request body verbatim; no validation is performed
/// on those keys, invalid ones are the service's concern.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// How long the service should keep the model resident after the call,
    /// either a number of seconds or a duration string such as `"5m"`.
    pub keep_alive: Option<Value>,
    pub stream: Option<bool>,
    /// Sampling parameters, serialized under the nested `options` key.
    pub options: Option<InferenceOptions>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<String>,
    pub extra: Map<String, Value>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep_alive(mut self, keep_alive: impl Into<Value>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn options(mut self, options: InferenceOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, tool_choice: impl Into<String>) -> Self {
        self.tool_choice = Some(tool_choice.into());
        self
    }

    /// Adds an arbitrary key to the request body.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Wire-format body for a single `/api/chat` turn.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub keep_alive: Value,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<InferenceOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    /// Assembles the request body from a model name, message history and
    /// optional parameters. `keep_alive` defaults to 5 and `stream` to
    /// false when absent; explicit option values win over the defaults,
    /// and over stray duplicates in `extra`.
    pub fn from_options(
        model: impl Into<String>,
        messages: Vec<Message>,
        options: ChatOptions,
    ) -> Self {
        let ChatOptions {
            keep_alive,
            stream,
            options: inference_options,
            tools,
            tool_choice,
            mut extra,
        } = options;

        let extra_keep_alive = extra.remove("keep_alive");
        let extra_stream = extra.remove("stream");

        Self {
            model: model.into(),
            messages,
            keep_alive: keep_alive
                .or(extra_keep_alive)
                .unwrap_or_else(|| Value::from(5)),
            stream: stream
                .or_else(|| extra_stream.and_then(|value| value.as_bool()))
                .unwrap_or(false),
            options: inference_options,
            tools,
            tool_choice,
            extra,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    /// The assistant reply. Defaults to an empty assistant message when the
    /// service omits the key.
    #[serde(default)]
    pub message: Message,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

/// Sampling parameters accepted under the nested `options` key.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InferenceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_last_n: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
}
