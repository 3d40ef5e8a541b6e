use serde::{Deserialize, Serialize};

use crate::tools::ToolCall;

/// Represents the role of a message sender in a chat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Creates a new message with a specific role and content.
    pub fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            images: None,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Creates a new 'system' message.
    pub fn system<T: Into<String>>(content: T) -> Self {
        Self::new(Role::System, content.into())
    }

    /// Creates a new 'user' message.
    pub fn user<T: Into<String>>(content: T) -> Self {
        Self::new(Role::User, content.into())
    }

    /// Creates a new 'assistant' message.
    pub fn assistant<T: Into<String>>(content: T) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    /// Creates a new 'tool' message carrying the output of a tool call,
    /// correlated by `tool_call_id`.
    pub fn tool<T, S>(content: T, tool_call_id: S) -> Self
    where
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            images: None,
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: None,
        }
    }

    /// Like [`Message::tool`], but also records the name of the function
    /// that produced the output. An empty name is omitted entirely.
    pub fn tool_named<T, S, N>(content: T, tool_call_id: S, name: N) -> Self
    where
        T: Into<String>,
        S: Into<String>,
        N: Into<String>,
    {
        let mut message = Self::tool(content, tool_call_id);
        let name = name.into();
        if !name.is_empty() {
            message.name = Some(name);
        }
        message
    }
}

impl Default for Message {
    fn default() -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            images: None,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}
