//! # Search Agent
//!
//! A search-augmented research agent backed by an OpenAI-compatible model
//! and a SearXNG instance.
//!
//! This library provides:
//! - A stage-based research loop with bounded iterations
//! - A text tool-call parser for models without native function calling
//! - Answer verification against the gathered evidence
//!
//! ## Architecture
//!
//! A run is a small state machine:
//! 1. Suggest search queries for the question
//! 2. Search, then let the model decide whether to search again
//! 3. Answer from the accumulated evidence
//! 4. Fact-check the answer and rewrite it if needed
//!
//! ## Example
//!
//! ```rust,ignore
//! use search_agent::{agent::Orchestrator, config::Config};
//!
//! let config = Config::from_env()?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//! let report = orchestrator.run("What is the capital of France?").await?;
//! println!("{}", report.response);
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
