//! Extension point for structured tool integrations.
//!
//! Tools expose capabilities (data queries, analytics, simulations) that an
//! LLM-driven workflow can invoke through a structured input/output
//! contract. No concrete production tool exists yet; the registry is the
//! seam future integrations plug into.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::RagError;

/// A pluggable capability with a structured input/output contract.
///
/// Implementations should be deterministic and side-effect free so they are
/// safe to call from an LLM-driven workflow.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Executes the tool with validated inputs and returns structured
    /// outputs.
    async fn run(&self, inputs: serde_json::Value) -> Result<serde_json::Value, RagError>;
}

/// Name-keyed lookup table of registered tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its own name; a later registration with the
    /// same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
