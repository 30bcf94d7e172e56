//! Web search: the `web_search` tool definition and the SearXNG client behind it.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Tool, MAX_QUERIES_PER_SEARCH, WEB_SEARCH};
use crate::config::SearchConfig;

/// Characters of result content shown to the model.
const CONTENT_PREVIEW_CHARS: usize = 300;

/// Search the web for information.
pub struct WebSearch;

impl Tool for WebSearch {
    fn name(&self) -> &str {
        WEB_SEARCH
    }

    fn description(&self) -> &str {
        "Search the web for information"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "queries": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of search queries (max 10)"
                }
            },
            "required": ["queries"]
        })
    }
}

/// A single ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub engine: String,
    pub score: Option<f64>,
}

/// Per-batch search options.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub categories: Vec<String>,
    pub engines: Vec<String>,
    pub language: String,
    pub max_results_per_query: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            engines: Vec::new(),
            language: "en".to_string(),
            max_results_per_query: 5,
        }
    }
}

impl From<&SearchConfig> for SearchParams {
    fn from(config: &SearchConfig) -> Self {
        Self {
            categories: config.categories.clone(),
            engines: config.engines.clone(),
            language: config.language.clone(),
            max_results_per_query: config.max_results_per_query,
        }
    }
}

/// A web search service.
///
/// Implementations honor at most [`MAX_QUERIES_PER_SEARCH`] queries and never
/// fail as a whole: a query whose transport fails is skipped, so the result
/// may be partial or empty.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, queries: &[String], params: &SearchParams) -> Vec<SearchResult>;
}

#[derive(Debug, Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxItem>,
}

#[derive(Debug, Deserialize)]
struct SearxItem {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
    engine: Option<String>,
    score: Option<f64>,
}

impl From<SearxItem> for SearchResult {
    fn from(item: SearxItem) -> Self {
        Self {
            title: html_decode(&item.title.unwrap_or_default()),
            url: item.url.unwrap_or_default(),
            content: html_decode(&item.content.unwrap_or_default()),
            engine: item.engine.unwrap_or_default(),
            score: item.score,
        }
    }
}

/// Client for the SearXNG JSON API.
#[derive(Debug)]
pub struct SearxngClient {
    http: Client,
    base_url: String,
}

impl SearxngClient {
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; SearchAgent/0.1)")
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    async fn search_one(&self, query: &str, params: &SearchParams) -> anyhow::Result<Vec<SearchResult>> {
        let mut form = vec![
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("language", params.language.clone()),
        ];
        if !params.categories.is_empty() {
            form.push(("categories", params.categories.join(",")));
        }
        if !params.engines.is_empty() {
            form.push(("engines", params.engines.join(",")));
        }

        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&form)
            .send()
            .await?
            .error_for_status()?;

        let body: SearxResponse = response.json().await?;

        Ok(body
            .results
            .into_iter()
            .take(params.max_results_per_query)
            .map(SearchResult::from)
            .collect())
    }
}

#[async_trait]
impl SearchClient for SearxngClient {
    async fn search(&self, queries: &[String], params: &SearchParams) -> Vec<SearchResult> {
        let mut results = Vec::new();

        for query in queries.iter().take(MAX_QUERIES_PER_SEARCH) {
            match self.search_one(query, params).await {
                Ok(hits) => {
                    tracing::debug!("Search '{}' returned {} results", query, hits.len());
                    results.extend(hits);
                }
                Err(e) => tracing::warn!("Search '{}' failed, skipping: {}", query, e),
            }
        }

        results
    }
}

/// Render results as a numbered list for the model.
pub fn format_results_for_llm(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No search results found.".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[{}] {}\n    URL: {}\n    {}",
                i + 1,
                r.title,
                r.url,
                preview(&r.content)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(CONTENT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
