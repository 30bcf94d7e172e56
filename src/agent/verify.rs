//! Fact check of the generated answer against the evidence.
//!
//! Output that cannot be read as a verdict counts as a pass, so a confused
//! checker never blocks an answer.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::stage::{Stage, StageContext, Transition};
use super::RunState;
use crate::llm::{ChatMessage, LlmError};

static OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Verdict {
    Passed,
    Failed(String),
}

/// Read the checker's verdict out of free text.
///
/// Only undecodable output passes by default. Once the object decodes, an
/// absent `passed` means pass and any other value is judged by truthiness.
pub(crate) fn parse_verdict(text: &str) -> Verdict {
    let Some(found) = OBJECT_RE.find(text) else {
        tracing::warn!("No verification object in checker output, assuming passed");
        return Verdict::Passed;
    };

    let verdict: Value = match serde_json::from_str(found.as_str()) {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::warn!("Failed to parse verification JSON, assuming passed: {}", e);
            return Verdict::Passed;
        }
    };

    if verdict.get("passed").map_or(true, is_truthy) {
        return Verdict::Passed;
    }

    let issues: Vec<String> = match verdict.get("issues") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };
    let feedback = verdict
        .get("feedback")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if issues.is_empty() {
        Verdict::Failed(feedback.to_string())
    } else {
        Verdict::Failed(format!("Issues: {}. {}", issues.join(", "), feedback))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn system_prompt(evidence: &str, response: &str) -> String {
    format!(
        r#"You are a fact-checker. Your job is to verify if the given response is accurate and supported by the search results.

Check for:
1. Factual accuracy - Does the response match the information in search results?
2. Unsupported claims - Are there claims not backed by the search results?
3. Hallucinations - Is there made-up information not present in the sources?

Search Results:
{evidence}

Response to verify:
{response}

Output your verification as JSON:
{{
  "passed": true/false,
  "issues": ["list of issues if any"],
  "feedback": "specific feedback for improvement if failed"
}}

Output ONLY the JSON, nothing else."#
    )
}

pub(crate) async fn run(state: &mut RunState, ctx: &StageContext<'_>) -> Result<Transition, LlmError> {
    if state.verification_passed() == Some(true) {
        tracing::debug!("Already verified, skipping");
        return Ok(Transition::Terminate);
    }

    let evidence = if state.search_results().is_empty() {
        "No search results available.".to_string()
    } else {
        state.evidence()
    };
    let messages = [
        ChatMessage::system(system_prompt(&evidence, state.response().unwrap_or_default())),
        ChatMessage::user(state.query()),
    ];

    let output = ctx.llm.complete(&messages).await?;
    tracing::debug!("Verification response: {}", output);

    match parse_verdict(&output) {
        Verdict::Passed => {
            tracing::debug!("-> end (verification passed)");
            state.record_verification_pass();
            Ok(Transition::Terminate)
        }
        Verdict::Failed(feedback) => {
            state.record_verification_failure(feedback.clone());
            if state.verification_attempts() < ctx.max_verification_retries {
                tracing::debug!("-> respond (verification failed: {})", feedback);
                state.count_verification_retry();
                Ok(Transition::Continue(Stage::Respond))
            } else {
                tracing::warn!(
                    "Verification failed after {} retries, keeping latest answer: {}",
                    state.verification_attempts(),
                    feedback
                );
                Ok(Transition::Terminate)
            }
        }
    }
}
