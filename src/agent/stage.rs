//! Stage identifiers, transitions and the shared context stages run with.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::llm::CompletionClient;
use crate::tools::{SearchClient, SearchParams};

/// A node of the research state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SuggestQueries,
    Search,
    Research,
    Respond,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SuggestQueries => "suggest_queries",
            Stage::Search => "search",
            Stage::Research => "research",
            Stage::Respond => "respond",
            Stage::Verify => "verify",
        };
        f.write_str(name)
    }
}

/// What a stage asks the orchestrator to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Continue(Stage),
    Terminate,
}

/// Collaborators and run-wide settings lent to each stage.
pub struct StageContext<'a> {
    pub llm: &'a dyn CompletionClient,
    pub search: &'a dyn SearchClient,
    pub search_params: &'a SearchParams,
    /// Answer rewrites allowed after failed fact checks
    pub max_verification_retries: usize,
    /// Date stamped into prompts
    pub today: NaiveDate,
}

/// Date as written into prompts, e.g. `October 19, 2026`.
pub fn format_prompt_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}
