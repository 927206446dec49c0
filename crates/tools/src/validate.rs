//! Uniform input validation against a [`ToolSchema`].

use agentcal_core::parse_timestamp;
use serde_json::{Map, Value};

use crate::error::{FieldViolation, ToolError};
use crate::r#trait::{ParamType, ToolInput, ToolSchema};

/// Check `payload` against every parameter of `schema`.
///
/// A missing or `null` payload counts as `{}`. Unknown fields are dropped and
/// optional fields given as `null` count as absent. Every violated field is
/// reported, not just the first.
pub fn validate(schema: &ToolSchema, payload: &Value) -> Result<ToolInput, ToolError> {
    let object = match payload {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        other => {
            return Err(ToolError::invalid(format!(
                "Invalid input: expected an object, got {}",
                type_name(other)
            )))
        }
    };

    let mut input = Map::new();
    let mut violations = Vec::new();
    for param in &schema.parameters {
        match object.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    violations.push(FieldViolation::new(&param.name, "is required"));
                }
            }
            Some(value) => match check(&param.param_type, value) {
                Ok(()) => {
                    input.insert(param.name.clone(), value.clone());
                }
                Err(message) => violations.push(FieldViolation::new(&param.name, message)),
            },
        }
    }

    if violations.is_empty() {
        Ok(input)
    } else {
        Err(ToolError::violations(violations))
    }
}

fn check(param_type: &ParamType, value: &Value) -> Result<(), String> {
    match param_type {
        ParamType::String { min_len } => {
            let s = value.as_str().ok_or("must be a string")?;
            match min_len {
                Some(n) if s.chars().count() < *n => {
                    Err(format!("must be at least {} character(s)", n))
                }
                _ => Ok(()),
            }
        }
        ParamType::Timestamp => {
            let s = value.as_str().ok_or("must be an ISO date string")?;
            parse_timestamp(s)
                .map(|_| ())
                .map_err(|_| format!("must be an ISO date string, got {:?}", s))
        }
        ParamType::Integer { min, max } => {
            let n = value.as_i64().ok_or("must be an integer")?;
            match (min, max) {
                (Some(lo), Some(hi)) if n < *lo || n > *hi => {
                    Err(format!("must be between {} and {}", lo, hi))
                }
                (Some(lo), None) if n < *lo => Err(format!("must be at least {}", lo)),
                (None, Some(hi)) if n > *hi => Err(format!("must be at most {}", hi)),
                _ => Ok(()),
            }
        }
        ParamType::Enum { values } => {
            let s = value.as_str().ok_or("must be a string")?;
            if values.iter().any(|v| v == s) {
                Ok(())
            } else {
                Err(format!("must be one of: {}", values.join(", ")))
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
