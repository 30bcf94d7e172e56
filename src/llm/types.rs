//! Message and tool-call types shared by the agent and the completion client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single role-tagged message sent to (or recorded from) the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,

    /// Set on tool messages so OpenAI-compatible servers accept them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Tool result message attributed to the given tool.
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
        }
    }
}

/// A tool invocation recovered from model text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Look up a single argument.
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Queries carried by a `web_search` call.
    ///
    /// Accepts a list of strings (non-string entries are skipped) or a single
    /// string.
    pub fn queries(&self) -> Vec<String> {
        match self.argument("queries") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|q| q.as_str())
                .map(str::to_string)
                .collect(),
            Some(Value::String(q)) => vec![q.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_message_serializes_call_id() {
        let msg = ChatMessage::tool("results", "web_search");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "web_search");
    }

    #[test]
    fn plain_message_omits_call_id() {
        let value = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn queries_from_list_skips_non_strings() {
        let args = json!({"queries": ["a", 3, "b"]});
        let call = ToolCall::new("web_search", args.as_object().unwrap().clone());
        assert_eq!(call.queries(), vec!["a", "b"]);
    }

    #[test]
    fn queries_from_single_string() {
        let args = json!({"queries": "rust async"});
        let call = ToolCall::new("web_search", args.as_object().unwrap().clone());
        assert_eq!(call.queries(), vec!["rust async"]);
    }

    #[test]
    fn queries_missing_is_empty() {
        let call = ToolCall::new("web_search", Map::new());
        assert!(call.queries().is_empty());
    }
}
