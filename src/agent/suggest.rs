//! Query suggestion: expand the user's question into targeted search queries.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::stage::{format_prompt_date, StageContext, Stage, Transition};
use super::RunState;
use crate::llm::{ChatMessage, LlmError, ToolCall};
use crate::tools::WEB_SEARCH;

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("array pattern is valid"));

fn system_prompt(today: &str) -> String {
    format!(
        r#"You are a search query optimizer. Your task is to analyze the user's question and generate effective search queries.

Today's date: {today}

Given the user's question, generate 3-10 search queries that will help find the most relevant and comprehensive information.

Guidelines:
- Generate at least 3 queries, up to 10 queries for complex topics
- Cover different aspects and angles of the question
- Use specific, targeted keywords
- Include variations: definitions, comparisons, recent updates, expert opinions, use cases
- Consider including recent/latest if the topic may have updates
- Output ONLY a JSON array of query strings, nothing else

Example output:
["what is X", "X vs Y comparison", "X latest news", "X best practices", "X tutorial"]"#
    )
}

/// Pull the first JSON array of strings out of `text`.
///
/// Falls back to `[query]` when nothing usable is found.
pub(crate) fn extract_queries(text: &str, query: &str) -> Vec<String> {
    let queries: Vec<String> = ARRAY_RE
        .find(text)
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
        .unwrap_or_default();

    if queries.is_empty() {
        vec![query.to_string()]
    } else {
        queries
    }
}

pub(crate) async fn run(state: &mut RunState, ctx: &StageContext<'_>) -> Result<Transition, LlmError> {
    tracing::debug!("Suggesting queries for: {}", state.query());

    let messages = [
        ChatMessage::system(system_prompt(&format_prompt_date(ctx.today))),
        ChatMessage::user(state.query()),
    ];
    let response = ctx.llm.complete(&messages).await?;
    tracing::debug!("Query suggestion response: {}", response);

    let queries = extract_queries(&response, state.query());
    tracing::debug!("Suggested queries: {:?}", queries);

    let summary = format!(
        "Suggested search queries: {}",
        serde_json::to_string(&queries).unwrap_or_default()
    );

    let mut arguments = Map::new();
    arguments.insert(
        "queries".to_string(),
        Value::Array(queries.into_iter().map(Value::String).collect()),
    );
    state.set_pending_tool_calls(vec![ToolCall::new(WEB_SEARCH, arguments)]);
    state.push_message(ChatMessage::assistant(summary));

    Ok(Transition::Continue(Stage::Search))
}
