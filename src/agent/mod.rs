//! Agent module - the research state machine.
//!
//! A run moves through explicit stages:
//! 1. Suggest search queries for the user's question
//! 2. Search and record the evidence
//! 3. Decide: search again or move on to answering
//! 4. Write the answer from the evidence
//! 5. Fact-check the answer, rewriting it a bounded number of times
//!
//! Each stage returns a [`Transition`] and the orchestrator applies it.

mod agent_loop;
mod prompt;
mod research;
mod respond;
mod search;
mod stage;
mod state;
mod suggest;
mod types;
mod verify;

#[cfg(test)]
mod test_utils;

pub use agent_loop::{AgentSettings, Orchestrator};
pub use prompt::{build_system_prompt, TOOL_LIST_END, TOOL_LIST_START};
pub use stage::{format_prompt_date, Stage, StageContext, Transition};
pub use state::{ResearchMode, RunState};
pub use types::{LogEntryType, RunLogEntry, RunReport};
