//! In-process registry of tool declarations.

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::types::AnthropicTool;

/// Parameters for registering a tool declaration.
#[derive(Debug, Clone)]
pub struct ToolCreateParams {
    pub name: String,
    pub description: Option<String>,
    /// JSON-schema shape of the tool input.
    pub input_schema: Value,
}

/// Registry keyed by tool name. Registered names feed the CLI's
/// allowed-tools list when declarations are attached to completion calls.
#[derive(Debug, Default)]
pub struct Tools {
    registered: DashMap<String, AnthropicTool>,
}

impl Tools {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a declaration, replacing any previous tool with the same
    /// name, and returns it.
    pub fn create(&self, params: ToolCreateParams) -> AnthropicTool {
        let tool = AnthropicTool {
            name: params.name.clone(),
            description: params.description,
            input_schema: params.input_schema,
        };
        self.registered.insert(params.name, tool.clone());
        debug!(target: "claude_sdk", tool = %tool.name, "tool registered");
        tool
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<AnthropicTool> {
        self.registered.get(name).map(|entry| entry.clone())
    }

    #[must_use]
    pub fn list(&self) -> Vec<AnthropicTool> {
        self.registered
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.registered
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn remove(&self, name: &str) -> Option<AnthropicTool> {
        self.registered.remove(name).map(|(_, tool)| tool)
    }
}
