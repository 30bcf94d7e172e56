//! Run state threaded through every stage of a research run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, ToolCall};
use crate::tools::{format_results_for_llm, SearchResult};

/// Policy preset controlling prompt shape and tool-call budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchMode {
    /// Search and finish; no reasoning tool.
    Speed,
    /// Brief reasoning before each action.
    Balanced,
    /// Exhaustive multi-angle research.
    Quality,
}

impl ResearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchMode::Speed => "speed",
            ResearchMode::Balanced => "balanced",
            ResearchMode::Quality => "quality",
        }
    }

    /// Whether `reasoning_preamble` is offered and mandatory.
    pub fn requires_reasoning(&self) -> bool {
        !matches!(self, ResearchMode::Speed)
    }

    /// Tool calls the model may emit per turn (None = not stated).
    pub fn max_tool_calls_per_turn(&self) -> Option<usize> {
        match self {
            ResearchMode::Speed => None,
            ResearchMode::Balanced => Some(6),
            ResearchMode::Quality => Some(10),
        }
    }
}

impl fmt::Display for ResearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "speed" => Ok(ResearchMode::Speed),
            "balanced" => Ok(ResearchMode::Balanced),
            "quality" => Ok(ResearchMode::Quality),
            other => Err(format!(
                "expected one of speed, balanced, quality, got: {}",
                other
            )),
        }
    }
}

/// Mutable record of one run.
///
/// Owned by the orchestrator and lent to one stage at a time. Fields are only
/// changed through the methods below, which keep the transcript, results and
/// reasoning append-only and the iteration counter monotonic.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    query: String,
    messages: Vec<ChatMessage>,
    search_results: Vec<SearchResult>,
    iteration: usize,
    max_iterations: usize,
    mode: ResearchMode,
    reasoning: Vec<String>,
    response: Option<String>,
    is_complete: bool,
    pending_tool_calls: Vec<ToolCall>,
    verification_passed: Option<bool>,
    verification_feedback: Option<String>,
    verification_attempts: usize,
}

impl RunState {
    /// Fresh state for `query`. `max_iterations` is clamped to at least 1.
    pub fn new(query: impl Into<String>, mode: ResearchMode, max_iterations: usize) -> Self {
        Self {
            query: query.into(),
            messages: Vec::new(),
            search_results: Vec::new(),
            iteration: 0,
            max_iterations: max_iterations.max(1),
            mode,
            reasoning: Vec::new(),
            response: None,
            is_complete: false,
            pending_tool_calls: Vec::new(),
            verification_passed: None,
            verification_feedback: None,
            verification_attempts: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn search_results(&self) -> &[SearchResult] {
        &self.search_results
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn mode(&self) -> ResearchMode {
        self.mode
    }

    pub fn reasoning(&self) -> &[String] {
        &self.reasoning
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        &self.pending_tool_calls
    }

    pub fn verification_passed(&self) -> Option<bool> {
        self.verification_passed
    }

    pub fn verification_feedback(&self) -> Option<&str> {
        self.verification_feedback.as_deref()
    }

    /// Failed fact checks that sent the answer back for a rewrite.
    pub fn verification_attempts(&self) -> usize {
        self.verification_attempts
    }

    /// True once the decision loop must stop searching.
    pub fn iteration_budget_exhausted(&self) -> bool {
        self.iteration >= self.max_iterations - 1
    }

    /// Numbered rendering of every result gathered so far.
    pub fn evidence(&self) -> String {
        format_results_for_llm(&self.search_results)
    }

    pub(crate) fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub(crate) fn extend_search_results(&mut self, results: impl IntoIterator<Item = SearchResult>) {
        self.search_results.extend(results);
    }

    pub(crate) fn push_reasoning(&mut self, thought: impl Into<String>) {
        self.reasoning.push(thought.into());
    }

    pub(crate) fn advance_iteration(&mut self) {
        self.iteration += 1;
    }

    pub(crate) fn mark_complete(&mut self) {
        self.is_complete = true;
    }

    pub(crate) fn set_response(&mut self, response: String) {
        self.response = Some(response);
        self.is_complete = true;
    }

    /// Queue tool calls for the next stage.
    pub(crate) fn set_pending_tool_calls(&mut self, calls: Vec<ToolCall>) {
        if !self.pending_tool_calls.is_empty() {
            tracing::warn!(
                "Replacing {} undrained pending tool calls",
                self.pending_tool_calls.len()
            );
        }
        self.pending_tool_calls = calls;
    }

    /// Drain the pending queue, leaving it empty.
    pub(crate) fn take_pending_tool_calls(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.pending_tool_calls)
    }

    pub(crate) fn record_verification_pass(&mut self) {
        self.verification_passed = Some(true);
        self.verification_feedback = None;
    }

    pub(crate) fn record_verification_failure(&mut self, feedback: String) {
        self.verification_passed = Some(false);
        self.verification_feedback = Some(feedback);
    }

    pub(crate) fn count_verification_retry(&mut self) {
        self.verification_attempts += 1;
    }
}
