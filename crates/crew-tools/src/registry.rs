//! Tool registry mapping symbolic names to implementations

use crate::Tool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Read-only registry of tools
///
/// A registry is assembled once per workflow family with [`ToolRegistry::builder`]
/// and then shared (usually as `Arc<ToolRegistry>`). Lookups never fail: an
/// unknown name is simply `None`, leaving the policy to the caller.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// List all registered tools, sorted by name
    ///
    /// Useful for building tool definitions to send to the LLM.
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.values().cloned().collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<Arc<dyn Tool>> for ToolRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ToolRegistry::builder(), ToolRegistryBuilder::register)
            .build()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Builder for ToolRegistry
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    /// Register a tool under its own name
    ///
    /// Registering a second tool with the same name replaces the first.
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Tool registered twice, keeping the latest");
        }
        self
    }

    /// Finish the registry
    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}
