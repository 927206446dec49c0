//! Tool abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::context::ToolContext;
use crate::error::ToolError;

/// A calendar operation that can be invoked by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool schema (for agent discovery and validation).
    fn schema(&self) -> &ToolSchema;

    /// Get tool name.
    fn name(&self) -> &str {
        &self.schema().name
    }

    /// Get tool description.
    fn description(&self) -> &str {
        &self.schema().description
    }

    /// Execute the tool against already validated input.
    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

/// Validated input object of a tool call.
pub type ToolInput = Map<String, Value>;

/// Output of a successful tool call.
pub type ToolOutput = Value;

/// Declared shape of a tool. Built once when the tool is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name, unique within a registry
    pub name: String,

    /// Description
    pub description: String,

    /// Parameters, in declaration order
    pub parameters: Vec<Parameter>,

    /// Behaviour hints
    pub annotations: ToolAnnotations,
}

impl ToolSchema {
    /// Start a schema with no parameters.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        annotations: ToolAnnotations,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            annotations,
        }
    }

    /// Add a parameter.
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Render the parameters as a JSON Schema object.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for p in &self.parameters {
            let mut prop = p.param_type.json_schema();
            prop["description"] = json!(p.description);
            properties.insert(p.name.clone(), prop);
            if p.required {
                required.push(json!(p.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Description
    pub description: String,

    /// Type and constraints
    pub param_type: ParamType,

    /// Required
    pub required: bool,
}

impl Parameter {
    /// A required parameter.
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            param_type,
            required: true,
        }
    }

    /// An optional parameter.
    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// Parameter type and the constraints checked before a handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamType {
    /// Any string, optionally with a minimum length
    String {
        /// Minimum length in characters
        min_len: Option<usize>,
    },
    /// ISO date or date-time string
    Timestamp,
    /// Whole number within an inclusive range
    Integer {
        /// Lower bound
        min: Option<i64>,
        /// Upper bound
        max: Option<i64>,
    },
    /// One of a fixed set of strings
    Enum {
        /// Allowed values
        values: Vec<String>,
    },
}

impl ParamType {
    /// Unconstrained string.
    pub fn string() -> Self {
        ParamType::String { min_len: None }
    }

    /// Non-empty string.
    pub fn non_empty_string() -> Self {
        ParamType::String { min_len: Some(1) }
    }

    /// Integer in `min..=max`.
    pub fn integer(min: i64, max: i64) -> Self {
        ParamType::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Integer `>= min`.
    pub fn integer_from(min: i64) -> Self {
        ParamType::Integer {
            min: Some(min),
            max: None,
        }
    }

    /// Closed set of strings.
    pub fn one_of(values: &[&str]) -> Self {
        ParamType::Enum {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            ParamType::String { min_len: None } => json!({ "type": "string" }),
            ParamType::String { min_len: Some(n) } => json!({ "type": "string", "minLength": n }),
            ParamType::Timestamp => json!({ "type": "string", "format": "date-time" }),
            ParamType::Integer { min, max } => {
                let mut schema = json!({ "type": "integer" });
                if let Some(min) = min {
                    schema["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    schema["maximum"] = json!(max);
                }
                schema
            }
            ParamType::Enum { values } => json!({ "type": "string", "enum": values }),
        }
    }
}

/// Declared behaviour of a tool, surfaced to agents as hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// Never changes state
    #[serde(rename = "readOnlyHint")]
    pub read_only: bool,

    /// Repeating the call has no further effect
    #[serde(rename = "idempotentHint")]
    pub idempotent: bool,

    /// May remove data
    #[serde(rename = "destructiveHint")]
    pub destructive: bool,
}

impl ToolAnnotations {
    /// Read-only query.
    pub const READ_ONLY: Self = Self {
        read_only: true,
        idempotent: true,
        destructive: false,
    };

    /// Write that can be safely repeated.
    pub const IDEMPOTENT: Self = Self {
        read_only: false,
        idempotent: true,
        destructive: false,
    };

    /// Write with a new effect every time.
    pub const WRITE: Self = Self {
        read_only: false,
        idempotent: false,
        destructive: false,
    };

    /// Repeatable write that removes data.
    pub const DESTRUCTIVE: Self = Self {
        read_only: false,
        idempotent: true,
        destructive: true,
    };
}
