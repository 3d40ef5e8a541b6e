mod errors;
mod tool;
mod tool_builder;

pub use errors::ToolExecutionError;
pub use tool::{
    Function, FunctionParameters, Property, Tool, ToolCall, ToolCallFunction, ToolHandler, ToolType,
};
pub use tool_builder::{ToolBuilder, ToolBuilderError};
