//! Scripted collaborators for stage and orchestrator tests.

use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::stage::StageContext;
use crate::llm::{ChatMessage, CompletionClient, LlmError, ToolCall, TOOL_CALL_END, TOOL_CALL_START};
use crate::tools::{SearchClient, SearchParams, SearchResult, MAX_QUERIES_PER_SEARCH, WEB_SEARCH};

/// Completion client replaying canned answers in order.
///
/// Every request is recorded; once the script runs out it fails.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
    }
}

/// Search client returning the same results for every batch.
pub struct StaticSearch {
    results: Vec<SearchResult>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl StaticSearch {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Behaves like a search service whose every request fails.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchClient for StaticSearch {
    async fn search(&self, queries: &[String], _params: &SearchParams) -> Vec<SearchResult> {
        self.batches.lock().unwrap().push(queries.to_vec());
        self.results.clone()
    }
}

/// Search client that answers some queries and fails the rest.
///
/// Failed queries are skipped the way `SearxngClient` skips transport errors.
pub struct FlakySearch {
    hits: Vec<(String, SearchResult)>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl FlakySearch {
    /// Queries not listed in `hits` fail.
    pub fn new(hits: &[(&str, SearchResult)]) -> Self {
        Self {
            hits: hits.iter().map(|(q, r)| (q.to_string(), r.clone())).collect(),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchClient for FlakySearch {
    async fn search(&self, queries: &[String], _params: &SearchParams) -> Vec<SearchResult> {
        self.batches.lock().unwrap().push(queries.to_vec());
        queries
            .iter()
            .take(MAX_QUERIES_PER_SEARCH)
            .filter_map(|query| {
                self.hits
                    .iter()
                    .find(|(hit, _)| hit == query)
                    .map(|(_, result)| result.clone())
            })
            .collect()
    }
}

fn default_params() -> &'static SearchParams {
    static PARAMS: OnceLock<SearchParams> = OnceLock::new();
    PARAMS.get_or_init(SearchParams::default)
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// Stage context allowing one verification retry.
pub fn context<'a>(llm: &'a ScriptedLlm, search: &'a dyn SearchClient) -> StageContext<'a> {
    StageContext {
        llm,
        search,
        search_params: default_params(),
        max_verification_retries: 1,
        today: test_date(),
    }
}

pub fn search_call(queries: &[&str]) -> ToolCall {
    let mut arguments = Map::new();
    arguments.insert(
        "queries".to_string(),
        Value::Array(queries.iter().map(|q| Value::String(q.to_string())).collect()),
    );
    ToolCall::new(WEB_SEARCH, arguments)
}

pub fn sample_result(title: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: format!("https://example.com/{}", title.to_lowercase()),
        content: format!("{} content", title),
        engine: "duckduckgo".to_string(),
        score: Some(1.0),
    }
}

/// Wrap call text in tool-call delimiters.
pub fn tool_block(calls: &str) -> String {
    format!("{}{}{}", TOOL_CALL_START, calls, TOOL_CALL_END)
}
