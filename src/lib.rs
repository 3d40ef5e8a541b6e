pub mod client;
pub mod config;
pub mod logging;
pub mod models;
pub mod tools;

mod discovery;
mod orchestrator;
pub(crate) mod util;

pub use client::{OllamaClient, DEFAULT_BASE_URL, DEFAULT_LIBRARY_URL, DEFAULT_LOAD_KEEP_ALIVE};
pub use config::ClientConfig;
pub use logging::init_default_tracing;
pub use models::base::{Message, Role};
pub use models::chat::{ChatOptions, ChatRequest, ChatResponse, ChatStreamChunk, InferenceOptions};
pub use models::errors::ClientError;
pub use models::tags::{CapabilityFilter, ModelEntry};
pub use tools::{
    Tool, ToolBuilder, ToolBuilderError, ToolCall, ToolCallFunction, ToolExecutionError,
    ToolHandler, ToolType,
};
