//! Search Agent - CLI Entry Point
//!
//! Runs one research query and prints the answer.

use clap::Parser;
use search_agent::agent::{Orchestrator, ResearchMode};
use search_agent::config::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Answer a question by searching the web and checking the result.
#[derive(Parser, Debug)]
#[command(name = "search-agent", version, about, long_about = None)]
struct Cli {
    /// Question to research
    query: String,

    /// Research mode: speed, balanced, quality
    #[arg(short, long)]
    mode: Option<ResearchMode>,

    /// Search/decide loop budget
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Print the full run report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(mode) = cli.mode {
        config.research_mode = mode;
    }
    if let Some(max_iterations) = cli.max_iterations {
        anyhow::ensure!(max_iterations > 0, "--max-iterations must be greater than zero");
        config.max_iterations = max_iterations;
    }

    // Initialize logging
    let default_filter = if config.debug {
        "search_agent=debug"
    } else {
        "search_agent=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Loaded configuration: model={}, mode={}",
        config.llm.model, config.research_mode
    );

    let orchestrator = Orchestrator::from_config(&config)?;
    let settings = orchestrator.settings();
    info!(
        "Research settings: max_iterations={}, max_verification_retries={}, deadline={:?}",
        settings.max_iterations, settings.max_verification_retries, settings.run_timeout
    );
    let report = orchestrator.run(&cli.query).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Query: {}", cli.query);
        println!("{}", "-".repeat(60));
        println!("{}", report.response);
    }

    Ok(())
}
