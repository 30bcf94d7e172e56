//! Research decision: ask the model what to do next and route accordingly.
//!
//! Routing, in priority order:
//! 1. any `done` call, or the iteration budget is spent: respond
//! 2. any `web_search` call: search again
//! 3. nothing actionable: respond
//!
//! Reasoning thoughts are recorded regardless of the route taken.

use serde_json::Value;

use super::prompt::build_system_prompt;
use super::stage::{Stage, StageContext, Transition};
use super::RunState;
use crate::llm::{parse_tool_calls, ChatMessage, LlmError, ToolCall};
use crate::tools::{DONE, REASONING_PREAMBLE, WEB_SEARCH};

/// Why the decision loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FinishReason {
    Done,
    IterationBudget,
    NoActionableCall,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Decision {
    Finish(FinishReason),
    Search(Vec<ToolCall>),
}

/// `reasoning_preamble`, also under its legacy `__reasoning_preamble` spelling.
fn is_reasoning_call(name: &str) -> bool {
    name.trim_start_matches('_') == REASONING_PREAMBLE
}

pub(crate) fn decide(calls: Vec<ToolCall>, budget_exhausted: bool) -> Decision {
    if calls.iter().any(|call| call.name == DONE) {
        return Decision::Finish(FinishReason::Done);
    }
    if budget_exhausted {
        return Decision::Finish(FinishReason::IterationBudget);
    }

    let searches: Vec<ToolCall> = calls.into_iter().filter(|call| call.name == WEB_SEARCH).collect();
    if searches.is_empty() {
        Decision::Finish(FinishReason::NoActionableCall)
    } else {
        Decision::Search(searches)
    }
}

pub(crate) async fn run(state: &mut RunState, ctx: &StageContext<'_>) -> Result<Transition, LlmError> {
    tracing::debug!(
        "Research decision (iteration {} of {})",
        state.iteration() + 1,
        state.max_iterations()
    );

    let mut messages = vec![
        ChatMessage::system(build_system_prompt(
            state.mode(),
            state.iteration(),
            state.max_iterations(),
            ctx.today,
        )),
        ChatMessage::user(state.query()),
    ];
    if !state.search_results().is_empty() {
        messages.push(ChatMessage::tool(state.evidence(), WEB_SEARCH));
    }

    tracing::debug!("Sending {} messages to LLM", messages.len());
    let response = ctx.llm.complete(&messages).await?;

    let calls = parse_tool_calls(&response);
    tracing::debug!(
        "Parsed tool calls: {:?}",
        calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );

    for call in calls.iter().filter(|call| is_reasoning_call(&call.name)) {
        if let Some(thought) = call.argument("thought").and_then(Value::as_str) {
            if !thought.trim().is_empty() {
                tracing::debug!("Reasoning: {}", thought);
                state.push_reasoning(thought);
            }
        }
    }

    state.push_message(ChatMessage::assistant(response));

    match decide(calls, state.iteration_budget_exhausted()) {
        Decision::Finish(reason) => {
            tracing::debug!("-> respond ({:?})", reason);
            state.mark_complete();
            Ok(Transition::Continue(Stage::Respond))
        }
        Decision::Search(searches) => {
            let queries: Vec<String> = searches.iter().flat_map(|call| call.queries()).collect();
            tracing::debug!("-> search (queries: {:?})", queries);
            state.set_pending_tool_calls(searches);
            Ok(Transition::Continue(Stage::Search))
        }
    }
}
