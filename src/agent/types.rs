//! Run report and execution log.

use serde::Serialize;

use super::stage::Stage;
use super::RunState;

/// Final outcome of a research run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The answer shown to the user
    pub response: String,

    /// Complete state at termination
    pub state: RunState,

    /// Detailed execution log
    pub log: Vec<RunLogEntry>,
}

/// A single entry in the run execution log.
#[derive(Debug, Clone, Serialize)]
pub struct RunLogEntry {
    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Stage that produced the entry
    pub stage: Stage,

    pub entry_type: LogEntryType,

    pub content: String,
}

impl RunLogEntry {
    pub fn new(stage: Stage, entry_type: LogEntryType, content: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            stage,
            entry_type,
            content: content.into(),
        }
    }
}

/// Types of log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    /// Stage entered or reasoning recorded
    Thinking,
    /// Tool calls queued for the next stage
    ToolCall,
    /// Search results gathered
    ToolResult,
    /// Answer produced
    Response,
    /// Fact-check outcome
    Verification,
}

/// Truncate a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}... [truncated]", &s[..cut]),
        None => s.to_string(),
    }
}
