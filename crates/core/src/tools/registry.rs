//! Tool registry.
//!
//! Name-indexed collection of tool handles, so front-ends can look tools up
//! by the name a user typed.

use std::collections::BTreeMap;

use super::handle::ToolHandle;

/// Registry of tool handles.
#[derive(Default)]
pub struct ToolRegistry {
    /// Handles indexed by tool name.
    tools: BTreeMap<String, ToolHandle>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool handle.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register(&mut self, handle: ToolHandle) {
        self.tools.insert(handle.name().to_string(), handle);
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolHandle> {
        self.tools.get(name)
    }

    /// Iterate over all registered tools, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &ToolHandle> {
        self.tools.values()
    }

    /// Get the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
