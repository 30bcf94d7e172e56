//! Orchestrator: drives a run through the stage state machine.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::Config;
use crate::llm::{CompletionClient, LlmError, OpenAiCompatClient};
use crate::tools::{SearchClient, SearchParams, SearxngClient};

use super::stage::{Stage, StageContext, Transition};
use super::types::{truncate_for_log, LogEntryType, RunLogEntry, RunReport};
use super::{research, respond, search, suggest, verify, ResearchMode, RunState};

/// Per-run knobs, fixed for the orchestrator's lifetime.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub mode: ResearchMode,
    pub max_iterations: usize,
    pub max_verification_retries: usize,
    pub search_params: SearchParams,
    pub run_timeout: Option<Duration>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AgentSettings {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.research_mode,
            max_iterations: config.max_iterations,
            max_verification_retries: config.max_verification_retries,
            search_params: SearchParams::from(&config.search),
            run_timeout: config.run_timeout,
        }
    }
}

/// The research agent.
///
/// Collaborators are built once and shared by every run.
pub struct Orchestrator {
    llm: Arc<dyn CompletionClient>,
    search: Arc<dyn SearchClient>,
    settings: AgentSettings,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn CompletionClient>,
        search: Arc<dyn SearchClient>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            llm,
            search,
            settings,
        }
    }

    /// Build an orchestrator talking to the configured HTTP services.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let llm = OpenAiCompatClient::new(&config.llm).context("Failed to build completion client")?;
        let search = SearxngClient::new(&config.search).context("Failed to build search client")?;

        Ok(Self::new(Arc::new(llm), Arc::new(search), AgentSettings::from(config)))
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Research `query` and return the verified answer with the run log.
    ///
    /// Fails when a completion call fails or the run deadline expires.
    pub async fn run(&self, query: &str) -> anyhow::Result<RunReport> {
        match self.settings.run_timeout {
            Some(limit) => tokio::time::timeout(limit, self.drive(query))
                .await
                .map_err(|_| anyhow::anyhow!("Run exceeded deadline of {:?}", limit))?,
            None => self.drive(query).await,
        }
    }

    async fn drive(&self, query: &str) -> anyhow::Result<RunReport> {
        let ctx = StageContext {
            llm: self.llm.as_ref(),
            search: self.search.as_ref(),
            search_params: &self.settings.search_params,
            max_verification_retries: self.settings.max_verification_retries,
            today: chrono::Local::now().date_naive(),
        };
        let mut state = RunState::new(query, self.settings.mode, self.settings.max_iterations);
        let mut log = Vec::new();

        tracing::info!(
            "Starting {} research (max {} iterations): {}",
            state.mode(),
            state.max_iterations(),
            query
        );

        let mut stage = Stage::SuggestQueries;
        loop {
            tracing::debug!("=== {} ===", stage);
            log.push(RunLogEntry::new(stage, LogEntryType::Thinking, format!("Entering {}", stage)));

            let reasoning_before = state.reasoning().len();
            let results_before = state.search_results().len();

            let transition = run_stage(stage, &mut state, &ctx)
                .await
                .with_context(|| format!("Stage {} failed", stage))?;

            record_progress(&mut log, stage, &state, reasoning_before, results_before);

            match transition {
                Transition::Continue(next) => stage = next,
                Transition::Terminate => break,
            }
        }

        let response = state
            .response()
            .map(str::to_string)
            .context("Run terminated without a response")?;

        tracing::info!(
            "Research finished after {} iterations ({} results, verified: {:?})",
            state.iteration(),
            state.search_results().len(),
            state.verification_passed()
        );

        Ok(RunReport {
            response,
            state,
            log,
        })
    }
}

async fn run_stage(stage: Stage, state: &mut RunState, ctx: &StageContext<'_>) -> Result<Transition, LlmError> {
    match stage {
        Stage::SuggestQueries => suggest::run(state, ctx).await,
        Stage::Search => search::run(state, ctx).await,
        Stage::Research => research::run(state, ctx).await,
        Stage::Respond => respond::run(state, ctx).await,
        Stage::Verify => verify::run(state, ctx).await,
    }
}

/// Log what `stage` just changed in the state.
fn record_progress(
    log: &mut Vec<RunLogEntry>,
    stage: Stage,
    state: &RunState,
    reasoning_before: usize,
    results_before: usize,
) {
    for thought in &state.reasoning()[reasoning_before..] {
        log.push(RunLogEntry::new(stage, LogEntryType::Thinking, thought.clone()));
    }

    match stage {
        Stage::SuggestQueries | Stage::Research => {
            for call in state.pending_tool_calls() {
                log.push(RunLogEntry::new(
                    stage,
                    LogEntryType::ToolCall,
                    format!("Calling tool: {} with queries: {:?}", call.name, call.queries()),
                ));
            }
        }
        Stage::Search => {
            log.push(RunLogEntry::new(
                stage,
                LogEntryType::ToolResult,
                format!(
                    "{} new results ({} total)",
                    state.search_results().len() - results_before,
                    state.search_results().len()
                ),
            ));
        }
        Stage::Respond => {
            if let Some(response) = state.response() {
                log.push(RunLogEntry::new(stage, LogEntryType::Response, truncate_for_log(response, 2000)));
            }
        }
        Stage::Verify => {
            let outcome = match (state.verification_passed(), state.verification_feedback()) {
                (Some(true), _) => "passed".to_string(),
                (_, Some(feedback)) => format!("failed: {}", truncate_for_log(feedback, 1000)),
                _ => "failed".to_string(),
            };
            log.push(RunLogEntry::new(stage, LogEntryType::Verification, outcome));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_utils::{sample_result, tool_block, FlakySearch, ScriptedLlm, StaticSearch};
    use crate::llm::ChatMessage;
    use async_trait::async_trait;

    const PASS: &str = r#"{"passed": true, "issues": [], "feedback": ""}"#;

    fn settings(mode: ResearchMode, max_iterations: usize) -> AgentSettings {
        AgentSettings {
            mode,
            max_iterations,
            ..AgentSettings::default()
        }
    }

    fn orchestrator(llm: &Arc<ScriptedLlm>, search: &Arc<StaticSearch>, settings: AgentSettings) -> Orchestrator {
        Orchestrator::new(llm.clone(), search.clone(), settings)
    }

    #[tokio::test]
    async fn single_search_then_done() {
        let done = tool_block("[done()]");
        let llm = Arc::new(ScriptedLlm::new([
            r#"["capital of France"]"#,
            done.as_str(),
            "Paris is the capital of France.",
            PASS,
        ]));
        let search = Arc::new(StaticSearch::new(vec![sample_result("Paris")]));

        let report = orchestrator(&llm, &search, settings(ResearchMode::Speed, 3))
            .run("What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(report.response, "Paris is the capital of France.");
        assert!(report.state.is_complete());
        assert_eq!(report.state.iteration(), 1);
        assert_eq!(report.state.verification_passed(), Some(true));
        assert_eq!(search.batches(), vec![vec!["capital of France"]]);
        assert!(report
            .log
            .iter()
            .any(|e| e.entry_type == LogEntryType::Verification && e.content == "passed"));
    }

    #[tokio::test]
    async fn failed_check_triggers_exactly_one_rewrite() {
        let done = tool_block(r#"[reasoning_preamble(thought="enough"), done()]"#);
        let llm = Arc::new(ScriptedLlm::new([
            r#"["q"]"#,
            done.as_str(),
            "draft",
            r#"{"passed": false, "issues": ["unsupported"], "feedback": "Cite sources."}"#,
            "rewrite",
            PASS,
        ]));
        let search = Arc::new(StaticSearch::new(vec![sample_result("Paris")]));

        let report = orchestrator(&llm, &search, settings(ResearchMode::Balanced, 3))
            .run("q")
            .await
            .unwrap();

        assert_eq!(report.response, "rewrite");
        assert_eq!(report.state.verification_attempts(), 1);
        assert_eq!(report.state.verification_passed(), Some(true));
        assert_eq!(report.state.reasoning(), ["enough"]);

        let rewrite_request = &llm.requests()[4];
        assert!(rewrite_request[0]
            .content
            .contains("Reviewer feedback: Issues: unsupported. Cite sources."));
    }

    #[tokio::test]
    async fn no_results_still_produce_an_answer() {
        let done = tool_block("[done()]");
        let llm = Arc::new(ScriptedLlm::new([r#"["q"]"#, done.as_str(), "I could not find sources.", PASS]));
        let search = Arc::new(StaticSearch::empty());

        let report = orchestrator(&llm, &search, settings(ResearchMode::Speed, 3))
            .run("obscure question")
            .await
            .unwrap();

        assert!(report.state.search_results().is_empty());
        assert_eq!(report.response, "I could not find sources.");
        let respond_request = &llm.requests()[2];
        assert!(respond_request[0].content.contains("No search results available."));
    }

    #[tokio::test]
    async fn partial_search_failure_answers_from_survivors() {
        let done = tool_block("[done()]");
        let llm = Arc::new(ScriptedLlm::new([
            r#"["alpha", "broken", "gamma"]"#,
            done.as_str(),
            "answer",
            PASS,
        ]));
        let search = Arc::new(FlakySearch::new(&[
            ("alpha", sample_result("Alpha")),
            ("gamma", sample_result("Gamma")),
        ]));
        let orchestrator = Orchestrator::new(llm.clone(), search.clone(), settings(ResearchMode::Speed, 3));

        let report = orchestrator.run("q").await.unwrap();

        assert_eq!(report.state.iteration(), 1);
        let titles: Vec<_> = report.state.search_results().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Gamma"]);
        let respond_request = &llm.requests()[2];
        assert!(respond_request[0].content.contains("[1] Alpha"));
        assert!(respond_request[0].content.contains("[2] Gamma"));
    }

    #[tokio::test]
    async fn persistent_failure_stops_at_retry_cap() {
        let failed = r#"{"passed": false, "feedback": "wrong"}"#;
        let done = tool_block("[done()]");
        let llm = Arc::new(ScriptedLlm::new([r#"["q"]"#, done.as_str(), "answer", failed]));
        let search = Arc::new(StaticSearch::empty());
        let settings = AgentSettings {
            max_verification_retries: 0,
            ..settings(ResearchMode::Speed, 3)
        };

        let report = orchestrator(&llm, &search, settings).run("q").await.unwrap();

        assert_eq!(report.response, "answer");
        assert_eq!(report.state.verification_passed(), Some(false));
        assert_eq!(report.state.verification_feedback(), Some("wrong"));
        assert_eq!(llm.requests().len(), 4);
    }

    #[tokio::test]
    async fn iteration_counts_search_executions() {
        let more = tool_block(r#"[web_search(queries=["more"])]"#);
        let llm = Arc::new(ScriptedLlm::new([
            r#"["first"]"#,
            more.as_str(),
            more.as_str(),
            "answer",
            PASS,
        ]));
        let search = Arc::new(StaticSearch::new(vec![sample_result("A")]));

        let report = orchestrator(&llm, &search, settings(ResearchMode::Speed, 3))
            .run("q")
            .await
            .unwrap();

        assert_eq!(report.state.iteration(), 2);
        assert_eq!(search.batches(), vec![vec!["first"], vec!["more"]]);
        assert_eq!(report.state.search_results().len(), 2);
    }

    #[tokio::test]
    async fn completion_failure_aborts_the_run() {
        let llm = Arc::new(ScriptedLlm::new(Vec::<&str>::new()));
        let search = Arc::new(StaticSearch::empty());

        let err = orchestrator(&llm, &search, settings(ResearchMode::Speed, 3))
            .run("q")
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("suggest_queries"));
        assert!(search.batches().is_empty());
    }

    struct StalledLlm;

    #[async_trait]
    impl CompletionClient for StalledLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn deadline_expiry_is_an_error() {
        let settings = AgentSettings {
            run_timeout: Some(Duration::from_millis(20)),
            ..settings(ResearchMode::Speed, 3)
        };
        let orchestrator = Orchestrator::new(Arc::new(StalledLlm), Arc::new(StaticSearch::empty()), settings);

        let err = orchestrator.run("q").await.unwrap_err();
        assert!(err.to_string().contains("deadline"));
    }

    #[test]
    fn settings_follow_config() {
        let config = Config::new(ResearchMode::Quality, 7);
        let settings = AgentSettings::from(&config);
        assert_eq!(settings.mode, ResearchMode::Quality);
        assert_eq!(settings.max_iterations, 7);
        assert_eq!(settings.max_verification_retries, 1);
        assert_eq!(settings.search_params.max_results_per_query, 5);

        let orchestrator = Orchestrator::new(Arc::new(StalledLlm), Arc::new(StaticSearch::empty()), settings);
        assert_eq!(orchestrator.settings().mode, ResearchMode::Quality);
        assert_eq!(orchestrator.settings().max_iterations, 7);
    }
}
