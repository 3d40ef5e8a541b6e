use std::collections::HashMap;

use super::tool::{Function, FunctionParameters, Property, Tool, ToolType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolBuilderError {
    MissingFunctionName,
    MissingFunctionDescription,
}

impl std::fmt::Display for ToolBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolBuilderError::MissingFunctionName => write!(f, "Function name is required."),
            ToolBuilderError::MissingFunctionDescription => {
                write!(f, "Function description is required.")
            }
        }
    }
}

impl std::error::Error for ToolBuilderError {}

#[derive(Debug, Default)]
pub struct ToolBuilder {
    tool_type: Option<ToolType>,
    function_name: Option<String>,
    function_description: Option<String>,
    function_properties: HashMap<String, Property>,
    function_required: Vec<String>,
}

impl ToolBuilder {
    /// Creates a new `ToolBuilder`.
    /// By default, `tool_type` will be `ToolType::Function` and the
    /// parameter type will be `"object"` if not explicitly set.
    pub fn new() -> Self {
        ToolBuilder {
            tool_type: Some(ToolType::Function),
            function_properties: HashMap::new(),
            function_required: Vec::new(),
            ..Default::default()
        }
    }

    /// Sets the type of the tool.
    /// Defaults to `ToolType::Function`.
    pub fn tool_type(mut self, tool_type: ToolType) -> Self {
        self.tool_type = Some(tool_type);
        self
    }

    /// Sets the name of the function for the tool. (Required)
    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Sets the description of the function for the tool. (Required)
    pub fn function_description<T>(mut self, description: T) -> Self
    where
        T: Into<String>,
    {
        self.function_description = Some(description.into());
        self
    }

    /// Adds a property to the function's parameters.
    ///
    /// # parameters
    /// * `name` - The name of the property.
    /// * `property_type` - The JSON schema type of the property (e.g., "string", "number", "boolean").
    /// * `description` - A description of what the property represents.
    pub fn add_property(
        mut self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.function_properties.insert(
            name.into(),
            Property {
                property_type: property_type.into(),
                description: description.into(),
            },
        );
        self
    }

    /// Marks a property as required for the function.
    /// The property must have been previously added using `add_property`.
    pub fn add_required_property(mut self, name: impl Into<String>) -> Self {
        self.function_required.push(name.into());
        self
    }

    /// Adds a property and immediately marks it as required.
    pub fn add_required(
        self,
        name: impl Into<String> + Clone,
        property_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.add_property(name.clone(), property_type, description)
            .add_required_property(name)
    }

    /// Consumes the builder and attempts to create a `Tool`.
    ///
    /// # Errors
    /// Returns a `ToolBuilderError` if required fields are missing.
    pub fn build(self) -> Result<Tool, ToolBuilderError> {
        let function_name = self
            .function_name
            .ok_or(ToolBuilderError::MissingFunctionName)?;
        let function_description = self
            .function_description
            .ok_or(ToolBuilderError::MissingFunctionDescription)?;

        let parameters = FunctionParameters {
            param_type: "object".to_string(),
            properties: self.function_properties,
            required: self.function_required,
        };

        let function = Function {
            name: function_name,
            description: function_description,
            parameters,
        };

        Ok(Tool {
            tool_type: self.tool_type.unwrap_or(ToolType::Function),
            function,
        })
    }
}
