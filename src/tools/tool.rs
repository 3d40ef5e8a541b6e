use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::ToolExecutionError;

/// Defines the type of tool available. Currently, only 'function' is supported.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Function,
}

/// Caller-supplied executor for tool calls requested by the model.
///
/// Receives the function name and its JSON arguments (always an object) and
/// produces a result string, or a [`ToolExecutionError`] if execution fails.
/// A failed execution is never recovered by the orchestrator; it propagates
/// to the caller and aborts the remaining calls in the batch.
pub type ToolHandler = Arc<
    dyn Fn(String, Value) -> Pin<Box<dyn Future<Output = Result<String, ToolExecutionError>> + Send>>
        + Send
        + Sync,
>;

/// Defines a tool (function) that the model can call.
///
/// This is a pure definition: it is serialized verbatim into the request
/// body under `tools`. Execution goes through a [`ToolHandler`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: Function,
}

impl Tool {
    /// Gets the name of the tool from its function definition.
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Defines a function, its description, and its arguments.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Function {
    pub name: String,
    pub description: String,
    pub parameters: FunctionParameters,
}

/// Defines the arguments for a function using a JSON schema-like structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FunctionParameters {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: HashMap<String, Property>,
    pub required: Vec<String>,
}

/// Defines a single property within function arguments.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Property {
    #[serde(rename = "type")]
    pub property_type: String,
    pub description: String,
}

/// Represents a tool call requested by the model.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolCall {
    /// Correlation identifier for the call. Some service versions omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The type of the tool (defaults to [`ToolType::Function`]).
    ///
    /// Some service versions omit this field, so a default is supplied.
    #[serde(
        default = "default_tool_call_type",
        skip_serializing_if = "is_default_tool_call_type"
    )]
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    /// Function being called.
    pub function: ToolCallFunction,
}

fn default_tool_call_type() -> ToolType {
    ToolType::Function
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_default_tool_call_type(tool_type: &ToolType) -> bool {
    *tool_type == default_tool_call_type()
}

/// Contains the name and arguments for a function call.
///
/// The wire payload sometimes carries an extra `index` field with a
/// floating-point value; downstream consumers reject it, so the typed
/// struct drops it and it is never echoed back. Non-object `arguments`
/// are coerced to an empty object at the parse boundary.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolCallFunction {
    pub name: String,
    #[serde(default = "empty_object", deserialize_with = "object_or_empty")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => value,
        _ => empty_object(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn index_field_is_stripped_on_round_trip() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "1",
            "function": {
                "name": "get_weather",
                "arguments": {"city": "Lyon"},
                "index": 0.0
            }
        }))
        .expect("deserializable");

        let echoed = serde_json::to_value(&call).expect("serializable");
        assert!(echoed["function"].get("index").is_none());
        assert_eq!(echoed["function"]["name"], "get_weather");
        assert_eq!(echoed["function"]["arguments"], json!({"city": "Lyon"}));
    }

    #[test]
    fn non_object_arguments_coerced_to_empty_object() {
        let call: ToolCall = serde_json::from_value(json!({
            "function": {"name": "noop", "arguments": "garbage"}
        }))
        .expect("deserializable");
        assert_eq!(call.function.arguments, json!({}));

        let call: ToolCall = serde_json::from_value(json!({
            "function": {"name": "noop", "arguments": null}
        }))
        .expect("deserializable");
        assert_eq!(call.function.arguments, json!({}));
    }

    #[test]
    fn missing_arguments_default_to_empty_object() {
        let call: ToolCall = serde_json::from_value(json!({
            "function": {"name": "noop"}
        }))
        .expect("deserializable");
        assert_eq!(call.function.arguments, json!({}));
    }

    #[test]
    fn missing_tool_type_defaults_to_function() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "1",
            "function": {"name": "noop", "arguments": {}}
        }))
        .expect("deserializable");
        assert_eq!(call.tool_type, ToolType::Function);

        // the default is not re-serialized
        let echoed = serde_json::to_value(&call).expect("serializable");
        assert!(echoed.get("type").is_none());
    }
}
