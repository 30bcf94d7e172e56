//! Search execution: run pending `web_search` calls and record the evidence.

use super::stage::{Stage, StageContext, Transition};
use super::RunState;
use crate::llm::{ChatMessage, LlmError};
use crate::tools::WEB_SEARCH;

pub(crate) async fn run(state: &mut RunState, ctx: &StageContext<'_>) -> Result<Transition, LlmError> {
    let mut queries: Vec<String> = state
        .take_pending_tool_calls()
        .iter()
        .filter(|call| call.name == WEB_SEARCH)
        .flat_map(|call| call.queries())
        .collect();

    if queries.is_empty() {
        queries.push(state.query().to_string());
    }

    tracing::debug!("Searching for: {:?}", queries);
    let results = ctx.search.search(&queries, ctx.search_params).await;
    tracing::debug!("Got {} results", results.len());

    state.extend_search_results(results);
    let evidence = state.evidence();
    state.push_message(ChatMessage::tool(evidence, WEB_SEARCH));
    state.advance_iteration();

    Ok(Transition::Continue(Stage::Research))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_utils::{context, search_call, sample_result, FlakySearch, ScriptedLlm, StaticSearch};
    use crate::agent::ResearchMode;
    use crate::llm::{Role, ToolCall};
    use serde_json::Map;

    #[tokio::test]
    async fn flattens_queries_across_calls_without_dedup() {
        let llm = ScriptedLlm::new(Vec::<&str>::new());
        let search = StaticSearch::new(vec![sample_result("Paris")]);
        let mut state = RunState::new("q", ResearchMode::Balanced, 5);
        state.set_pending_tool_calls(vec![
            search_call(&["a", "b"]),
            ToolCall::new("done", Map::new()),
            search_call(&["b"]),
        ]);

        let transition = run(&mut state, &context(&llm, &search)).await.unwrap();

        assert_eq!(transition, Transition::Continue(Stage::Research));
        assert_eq!(search.batches(), vec![vec!["a", "b", "b"]]);
        assert!(state.pending_tool_calls().is_empty());
        assert_eq!(state.iteration(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_user_query() {
        let llm = ScriptedLlm::new(Vec::<&str>::new());
        let search = StaticSearch::empty();
        let mut state = RunState::new("original question", ResearchMode::Speed, 5);

        run(&mut state, &context(&llm, &search)).await.unwrap();

        assert_eq!(search.batches(), vec![vec!["original question"]]);
    }

    #[tokio::test]
    async fn accumulates_results_and_renders_all_of_them() {
        let llm = ScriptedLlm::new(Vec::<&str>::new());
        let search = StaticSearch::new(vec![sample_result("one")]);
        let mut state = RunState::new("q", ResearchMode::Speed, 5);

        run(&mut state, &context(&llm, &search)).await.unwrap();
        run(&mut state, &context(&llm, &search)).await.unwrap();

        assert_eq!(state.search_results().len(), 2);
        assert_eq!(state.iteration(), 2);
        let last = state.messages().last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert!(last.content.contains("[1] one"));
        assert!(last.content.contains("[2] one"));
        assert_eq!(state.messages().len(), 2);
    }

    #[tokio::test]
    async fn keeps_results_of_queries_that_succeeded() {
        let llm = ScriptedLlm::new(Vec::<&str>::new());
        let search = FlakySearch::new(&[
            ("alpha", sample_result("Alpha")),
            ("gamma", sample_result("Gamma")),
        ]);
        let mut state = RunState::new("q", ResearchMode::Balanced, 5);
        state.set_pending_tool_calls(vec![search_call(&["alpha", "broken", "gamma"])]);

        let transition = run(&mut state, &context(&llm, &search)).await.unwrap();

        assert_eq!(transition, Transition::Continue(Stage::Research));
        assert_eq!(search.batches(), vec![vec!["alpha", "broken", "gamma"]]);
        let titles: Vec<_> = state.search_results().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Gamma"]);
        assert_eq!(state.iteration(), 1);

        let last = state.messages().last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert!(last.content.starts_with("[1] Alpha"));
        assert!(last.content.contains("[2] Gamma"));
    }
}
