//! Answer generation from the gathered evidence.

use super::stage::{Stage, StageContext, Transition};
use super::RunState;
use crate::llm::{ChatMessage, LlmError};

const NO_RESULTS: &str = "No search results available.";

fn system_prompt(state: &RunState) -> String {
    let evidence = if state.search_results().is_empty() {
        NO_RESULTS.to_string()
    } else {
        state.evidence()
    };

    let mut prompt = format!(
        r#"You are a helpful research assistant. Based on the search results provided, generate a comprehensive and accurate response to the user's query.

Guidelines:
- Use the search results to provide factual, up-to-date information
- Cite sources when possible by mentioning the source
- Be concise but thorough
- If the search results are insufficient, acknowledge the limitations

Search Results:
{evidence}"#
    );

    if !state.reasoning().is_empty() {
        let bullets: Vec<String> = state.reasoning().iter().map(|r| format!("- {}", r)).collect();
        prompt.push_str("\n\nResearch reasoning:\n");
        prompt.push_str(&bullets.join("\n"));
    }

    // Only set after a failed fact check.
    if let Some(feedback) = state.verification_feedback() {
        prompt.push_str(&format!(
            "\n\nA previous answer failed fact-checking against the search results.\nReviewer feedback: {}\nRewrite the answer so every claim is supported by the search results.",
            feedback
        ));
    }

    prompt
}

pub(crate) async fn run(state: &mut RunState, ctx: &StageContext<'_>) -> Result<Transition, LlmError> {
    tracing::debug!("Generating response from {} results", state.search_results().len());

    let messages = [ChatMessage::system(system_prompt(state)), ChatMessage::user(state.query())];
    let response = ctx.llm.complete(&messages).await?;

    state.set_response(response.clone());
    state.push_message(ChatMessage::assistant(response));

    Ok(Transition::Continue(Stage::Verify))
}
