//! Calendar Tools
//!
//! Named, schema-validated operations agents invoke on the calendar. Each
//! tool declares its input schema and behaviour hints as data; one routine
//! validates every payload before a handler runs.

#![warn(missing_docs)]

pub mod r#trait;
pub mod calendar;
pub mod context;
pub mod error;
pub mod registry;
pub mod validate;

pub use r#trait::{
    ParamType, Parameter, Tool, ToolAnnotations, ToolInput, ToolOutput, ToolSchema,
};
pub use context::{Clock, FixedClock, SystemClock, ToolContext};
pub use error::{ErrorKind, FieldViolation, ToolError};
pub use registry::ToolRegistry;
pub use validate::validate;

/// Result type for tool calls
pub type Result<T> = std::result::Result<T, ToolError>;
