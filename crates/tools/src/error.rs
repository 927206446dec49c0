//! Tool errors and their wire envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field name
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl FieldViolation {
    /// Create a violation.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error kind as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Schema or domain rule violation
    InvalidInput,
    /// Referenced event or user does not exist
    NotFound,
    /// No tool registered under the name
    ToolNotFound,
    /// Persistence or other internal failure
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(s)
    }
}

/// Errors raised by tools and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Input rejected
    #[error("{message}")]
    InvalidInput {
        /// Summary message
        message: String,
        /// Every violated field, empty for domain rule failures
        violations: Vec<FieldViolation>,
    },

    /// Referenced entity missing
    #[error("{0}")]
    NotFound(String),

    /// Unknown tool name
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Domain rule violation with no field list.
    pub fn invalid(message: impl Into<String>) -> Self {
        ToolError::InvalidInput {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Schema violations. Callers pass at least one.
    pub fn violations(violations: Vec<FieldViolation>) -> Self {
        let details = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ToolError::InvalidInput {
            message: format!("Invalid input: {}", details),
            violations,
        }
    }

    /// The kind reported on the wire.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ToolError::NotFound(_) => ErrorKind::NotFound,
            ToolError::ToolNotFound(_) => ErrorKind::ToolNotFound,
            ToolError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// `{ "error": { "kind", "message", "violations"? } }`
    pub fn to_envelope(&self) -> Value {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let ToolError::InvalidInput { violations, .. } = self {
            if !violations.is_empty() {
                error["violations"] = json!(violations);
            }
        }
        json!({ "error": error })
    }
}

impl From<agentcal_storage::StorageError> for ToolError {
    fn from(e: agentcal_storage::StorageError) -> Self {
        ToolError::Internal(e.to_string())
    }
}
