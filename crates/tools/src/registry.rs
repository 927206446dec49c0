//! Tool registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::calendar;
use crate::error::ToolError;
use crate::r#trait::{Tool, ToolSchema};

/// Tools by name, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every calendar tool.
    pub fn calendar() -> Self {
        let mut registry = Self::new();
        for tool in calendar::all_tools() {
            // Names are distinct constants.
            let _ = registry.register(tool);
        }
        registry
    }

    /// Register a tool. Fails when the name is taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ToolError::invalid(format!("Tool already registered: {}", name)));
        }
        debug!("Registering tool {}", name);
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| self.tools[i].clone())
    }

    /// Schemas of every tool, in registration order.
    pub fn schemas(&self) -> Vec<&ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Names of every tool, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_calendar_registry_has_all_tools() {
        let registry = ToolRegistry::calendar();
        assert_eq!(registry.len(), 16);
        let names: HashSet<_> = registry.names().into_iter().collect();
        assert_eq!(names.len(), 16);
        assert!(names.iter().all(|n| n.starts_with("calendar_")));
        assert!(registry.get("calendar_create_event").is_some());
        assert!(registry.get("calendar_teleport").is_none());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = ToolRegistry::calendar();
        let again = registry.get("calendar_get_event").unwrap();
        assert!(registry.register(again).is_err());
        assert_eq!(registry.len(), 16);
    }

    #[test]
    fn test_read_only_tools_are_idempotent_and_safe() {
        let registry = ToolRegistry::calendar();
        for schema in registry.schemas() {
            if schema.annotations.read_only {
                assert!(schema.annotations.idempotent, "{}", schema.name);
                assert!(!schema.annotations.destructive, "{}", schema.name);
            }
        }
        let delete = registry.get("calendar_delete_event").unwrap();
        assert!(delete.schema().annotations.destructive);
    }
}
