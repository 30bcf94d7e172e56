//! System prompt templates for the research decision step.

use chrono::NaiveDate;

use super::stage::format_prompt_date;
use super::ResearchMode;
use crate::llm::{TOOL_CALL_END, TOOL_CALL_START};
use crate::tools::ToolRegistry;

/// Marker opening the tool catalogue listing.
pub const TOOL_LIST_START: &str = "<|tool_list_start|>";
/// Marker closing the tool catalogue listing.
pub const TOOL_LIST_END: &str = "<|tool_list_end|>";

/// Build the decision-step system prompt for `mode`.
///
/// Pure: the same inputs always give the same prompt. `iteration` is
/// zero-based and shown to the model as `iteration + 1`.
pub fn build_system_prompt(
    mode: ResearchMode,
    iteration: usize,
    max_iterations: usize,
    today: NaiveDate,
) -> String {
    let tool_desc = ToolRegistry::for_mode(mode).to_json_listing();
    let today = format_prompt_date(today);

    match (mode, mode.max_tool_calls_per_turn()) {
        (ResearchMode::Balanced, Some(cap)) => {
            balanced_prompt(&tool_desc, iteration, max_iterations, &today, cap)
        }
        (ResearchMode::Quality, Some(cap)) => {
            quality_prompt(&tool_desc, iteration, max_iterations, &today, cap)
        }
        // Speed mode states no per-turn cap.
        _ => speed_prompt(&tool_desc, iteration, max_iterations, &today),
    }
}

fn speed_prompt(tool_desc: &str, iteration: usize, max_iterations: usize, today: &str) -> String {
    format!(
        r#"You are an action orchestrator. Your job is to fulfill user requests by selecting and executing the available tools. Never reply with free-form text.

Today's date: {today}

You are currently on iteration {current} of your research process and have {max_iterations} total iterations so act efficiently.
When you are finished, you must call the `done` tool. Never output text directly.

<goal>
Fulfill the user's request as quickly as possible using the available tools.
Call tools to gather information or perform tasks as needed.
</goal>

<core_principle>
Your knowledge is outdated; use web search to ground answers even for seemingly basic facts.
</core_principle>

{TOOL_LIST_START}
{tool_desc}
{TOOL_LIST_END}

<response_protocol>
- NEVER output normal text to the user. ONLY call tools using {TOOL_CALL_START} and {TOOL_CALL_END} tokens.
- Write calls as [tool_name(arg=value)], for example {TOOL_CALL_START}[web_search(queries=["query one", "query two"])]{TOOL_CALL_END}
- Default to web_search when information is missing or stale; keep queries targeted (max 10 per call).
- Call done when you have gathered enough to answer or performed the required actions.
</response_protocol>"#,
        current = iteration + 1,
    )
}

fn balanced_prompt(
    tool_desc: &str,
    iteration: usize,
    max_iterations: usize,
    today: &str,
    cap: usize,
) -> String {
    format!(
        r#"You are an action orchestrator. Your job is to fulfill user requests by reasoning briefly and executing the available tools. Never reply with free-form text.

Today's date: {today}

You are currently on iteration {current} of your research process and have {max_iterations} total iterations so act efficiently.
When you are finished, you must call the `done` tool. Never output text directly.

<goal>
Fulfill the user's request with concise reasoning plus focused actions.
You must call the reasoning_preamble tool before every tool call in this assistant turn.
Alternate: reasoning_preamble -> tool -> reasoning_preamble -> tool ... and finish with reasoning_preamble -> done.
</goal>

<core_principle>
Your knowledge is outdated; use web search to ground answers even for seemingly basic facts.
You can call at most {cap} tools total per turn.
</core_principle>

{TOOL_LIST_START}
YOU MUST CALL reasoning_preamble BEFORE EVERY TOOL CALL IN THIS ASSISTANT TURN.
{tool_desc}
{TOOL_LIST_END}

<response_protocol>
- NEVER output normal text to the user. ONLY call tools using {TOOL_CALL_START} and {TOOL_CALL_END} tokens.
- Write calls as [tool_name(arg=value)], for example {TOOL_CALL_START}[reasoning_preamble(thought="why"), web_search(queries=["query"])]{TOOL_CALL_END}
- Start with reasoning_preamble and call it before every tool call (including done).
- Default to web_search when information is missing or stale; keep queries targeted (max 10 per call).
- Call done only after you have the needed info or actions completed.
</response_protocol>"#,
        current = iteration + 1,
    )
}

fn quality_prompt(
    tool_desc: &str,
    iteration: usize,
    max_iterations: usize,
    today: &str,
    cap: usize,
) -> String {
    format!(
        r#"You are a deep-research orchestrator. Your job is to fulfill user requests with thorough, comprehensive research. Never reply with free-form text.

Today's date: {today}

You are currently on iteration {current} of your research process and have {max_iterations} total iterations.
When you are finished, you must call the `done` tool. Never output text directly.

<goal>
Conduct the deepest, most thorough research possible. Leave no stone unturned.
Follow an iterative reason-act loop: call reasoning_preamble before every tool call.
Finish with done only when you have comprehensive, multi-angle information.
</goal>

<core_principle>
Your knowledge is outdated; always use the available tools to ground answers.
This is DEEP RESEARCH mode, so be exhaustive. Explore multiple angles: definitions, features, comparisons, recent news, expert opinions, use cases, limitations.
You can call up to {cap} tools total per turn.
</core_principle>

{TOOL_LIST_START}
YOU MUST CALL reasoning_preamble BEFORE EVERY TOOL CALL IN THIS ASSISTANT TURN.
{tool_desc}
{TOOL_LIST_END}

<research_strategy>
For any topic, consider searching:
1. Core definition/overview - What is it?
2. Features/capabilities - What can it do?
3. Comparisons - How does it compare to alternatives?
4. Recent news/updates - What's the latest?
5. Reviews/opinions - What do experts say?
</research_strategy>

<response_protocol>
- NEVER output normal text to the user. ONLY call tools using {TOOL_CALL_START} and {TOOL_CALL_END} tokens.
- Write calls as [tool_name(arg=value)], for example {TOOL_CALL_START}[reasoning_preamble(thought="why"), web_search(queries=["query"])]{TOOL_CALL_END}
- Follow an iterative loop: reasoning_preamble -> tool call -> reasoning_preamble -> tool call -> ... -> done.
- Aim for 4-7 information-gathering calls covering different angles.
- Call done only after comprehensive research is complete.
</response_protocol>"#,
        current = iteration + 1,
    )
}
