use crate::error::{Result, ToolError};
use crate::traits::Tool;
use parley_core::ToolDefinition;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tools keyed by name. Iteration order is by name, so the tool list sent
/// to the model is stable between requests.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Result<Self> {
        self.register(Arc::new(tool))?;
        Ok(self)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| t.definition().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ToolOutput;
    use async_trait::async_trait;
    use parley_core::Context;
    use serde_json::Value;

    struct MockTool {
        def: ToolDefinition,
    }

    impl MockTool {
        fn new(name: &str) -> Self {
            Self {
                def: ToolDefinition::new(name, format!("{} tool", name)),
            }
        }
    }

    #[async_trait]
    impl Tool for MockTool {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        async fn execute(&self, _ctx: &Context, _input: Value) -> Result<ToolOutput> {
            Ok(ToolOutput::text("mock output"))
        }
    }

    #[test]
    fn test_registry_register() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("test_tool"))).unwrap();

        assert!(registry.contains("test_tool"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_duplicate() {
        let mut registry = ToolRegistry::new();

        registry.register(Arc::new(MockTool::new("dup"))).unwrap();
        let result = registry.register(Arc::new(MockTool::new("dup")));

        assert!(matches!(result, Err(ToolError::AlreadyRegistered(ref n)) if n == "dup"));
    }

    #[test]
    fn test_definitions_sorted_by_name() {
        let registry = ToolRegistry::new()
            .with_tool(MockTool::new("tool_b"))
            .unwrap()
            .with_tool(MockTool::new("tool_a"))
            .unwrap();

        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["tool_a", "tool_b"]);
        assert_eq!(registry.list(), vec!["tool_a", "tool_b"]);
    }

    #[test]
    fn test_registry_unregister() {
        let mut registry = ToolRegistry::new();

        registry.register(Arc::new(MockTool::new("removable"))).unwrap();
        assert!(registry.unregister("removable").is_some());
        assert!(!registry.contains("removable"));
        assert!(registry.is_empty());
    }
}
