pub mod base;
pub mod chat;
pub mod errors;
pub mod tags;

pub use base::{Message, Role};
pub use chat::{ChatOptions, ChatRequest, ChatResponse, ChatStreamChunk, InferenceOptions};
pub use errors::ClientError;
pub use tags::{CapabilityFilter, LibraryModel, ModelEntry, TagsResponse};
