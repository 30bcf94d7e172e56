//! Control tools: they carry no side effect beyond steering the research loop.

use serde_json::{json, Value};

use super::{Tool, DONE, REASONING_PREAMBLE};

/// Signals that research is complete.
pub struct Done;

impl Tool for Done {
    fn name(&self) -> &str {
        DONE
    }

    fn description(&self) -> &str {
        "Signal that research is complete"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }
}

/// Lets the model state its reasoning before each action.
pub struct ReasoningPreamble;

impl Tool for ReasoningPreamble {
    fn name(&self) -> &str {
        REASONING_PREAMBLE
    }

    fn description(&self) -> &str {
        "Express your reasoning before each tool call"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "thought": {
                    "type": "string",
                    "description": "Your reasoning for the next step"
                }
            },
            "required": ["thought"]
        })
    }
}
