//! Tool catalog and tool result types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description used when a schema property carries none
pub const NO_PARAMETER_DESCRIPTION: &str = "No description provided.";

/// One parameter of a tool, as advertised by its input schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Whether the schema lists this parameter as required
    pub required: bool,
}

/// A callable capability reported by a tool provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within its provider
    pub name: String,
    /// Free-text description for the model
    pub description: String,
    /// Parameters in schema order
    pub parameters: Vec<ParameterSpec>,
    /// Raw JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a tool with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            input_schema: Value::Object(Default::default()),
        }
    }

    /// Create a tool from a JSON Schema object (`properties` + `required`)
    pub fn from_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        let parameters = parameters_from_schema(&input_schema);
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            input_schema,
        }
    }

    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Render the tool for inclusion in a model prompt
    ///
    /// ```text
    /// Tool: echo
    /// Description: A simple echo tool
    /// Arguments:
    /// - message: Text to echo (required)
    /// ```
    pub fn render_for_prompt(&self) -> String {
        let arguments = if self.parameters.is_empty() {
            "  No arguments.".to_string()
        } else {
            self.parameters
                .iter()
                .map(|p| {
                    let marker = if p.required { "(required)" } else { "(optional)" };
                    format!("- {}: {} {}", p.name, p.description, marker)
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "Tool: {}\nDescription: {}\nArguments:\n{}\n",
            self.name, self.description, arguments
        )
    }
}

fn parameters_from_schema(schema: &Value) -> Vec<ParameterSpec> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, info)| ParameterSpec {
            name: name.clone(),
            description: info
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or(NO_PARAMETER_DESCRIPTION)
                .to_string(),
            required: required.contains(&name.as_str()),
        })
        .collect()
}

/// Progress metadata attached to a tool result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolProgress {
    pub progress: f64,
    pub total: f64,
}

impl ToolProgress {
    /// Read `progress` and `total` from a JSON object, if both are numeric
    pub fn from_value(value: &Value) -> Option<Self> {
        let progress = value.get("progress")?.as_f64()?;
        let total = value.get("total")?.as_f64()?;
        Some(Self { progress, total })
    }

    /// Completion percentage, `None` when `total` is not positive
    pub fn percentage(&self) -> Option<f64> {
        if self.total > 0.0 {
            Some(self.progress / self.total * 100.0)
        } else {
            None
        }
    }
}

/// Raw result of a tool invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text parts of the result
    pub content: Vec<String>,
    /// Whether the provider flagged this result as a tool-level error
    #[serde(rename = "isError", default)]
    pub is_error: bool,
    /// Structured payload, if the provider sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
    /// Progress metadata found in the structured payload or the result's `_meta`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ToolProgress>,
}

impl ToolOutput {
    /// A successful single-text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![text.into()],
            ..Default::default()
        }
    }

    /// Build a result from its parts, extracting progress metadata
    pub fn from_parts(content: Vec<String>, is_error: bool, structured: Option<Value>) -> Self {
        let progress = structured.as_ref().and_then(ToolProgress::from_value);
        Self {
            content,
            is_error,
            structured,
            progress,
        }
    }

    /// Text content joined with newlines; falls back to the structured payload
    pub fn to_text(&self) -> String {
        if self.content.is_empty() {
            if let Some(structured) = &self.structured {
                return structured.to_string();
            }
        }
        self.content.join("\n")
    }
}
