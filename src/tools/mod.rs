//! Tool catalogue advertised to the model.
//!
//! Tools here are never executed generically: the model requests them through
//! text tool calls and the agent stages act on the parsed calls. The catalogue
//! only describes the call surface (name, description, JSON parameter schema).

mod control;
mod web;

use serde::Serialize;
use serde_json::Value;

use crate::agent::ResearchMode;

pub use control::{Done, ReasoningPreamble};
pub use web::{format_results_for_llm, SearchClient, SearchParams, SearchResult, SearxngClient, WebSearch};

/// Tool names as they appear in model output.
pub const WEB_SEARCH: &str = "web_search";
pub const DONE: &str = "done";
pub const REASONING_PREAMBLE: &str = "reasoning_preamble";

/// Queries honored per search batch; extra queries are dropped.
pub const MAX_QUERIES_PER_SEARCH: usize = 10;

/// A tool the model may call.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments.
    fn parameters_schema(&self) -> Value;
}

/// Serializable description of a tool, as embedded in prompts.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Ordered set of tools available in one research mode.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Catalogue for `mode`: `reasoning_preamble` leads in balanced and quality modes.
    pub fn for_mode(mode: ResearchMode) -> Self {
        let mut tools: Vec<Box<dyn Tool>> = Vec::new();
        if mode.requires_reasoning() {
            tools.push(Box::new(ReasoningPreamble));
        }
        tools.push(Box::new(WebSearch));
        tools.push(Box::new(Done));

        Self { tools }
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Pretty-printed JSON listing of the catalogue.
    pub fn to_json_listing(&self) -> String {
        serde_json::to_string_pretty(&self.list_tools()).unwrap_or_else(|_| "[]".to_string())
    }
}
