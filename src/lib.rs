#![doc = include_str!("../README.md")]
#![warn(clippy::all)]

//! repo-analyzer - improvement suggestions for source repositories
//!
//! A repository URL is fetched, its most informative files are packed into a
//! prompt, a local Ollama model is asked for a review, and the reply is parsed
//! into a summary and a list of improvements.
//!
//! ## Usage
//! ```rust,ignore
//! use repo_analyzer::{AnalysisRequest, Analyzer, Config, OllamaClient};
//! use std::sync::Arc;
//!
//! async fn example() -> repo_analyzer::Result<()> {
//!     let config = Config::load(None)?;
//!     let model = Arc::new(OllamaClient::new(&config)?);
//!     let analyzer = Analyzer::new(Arc::new(config), model);
//!
//!     let result = analyzer
//!         .analyze(&AnalysisRequest { repo_url: "https://github.com/rust-lang/log".into() })
//!         .await?;
//!     println!("{}", result.summary);
//!     Ok(())
//! }
//! ```

/// Pipeline orchestration
pub mod analyzer;
/// REST API functionality for web service
pub mod api;
/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Repository ingestion strategies
pub mod fetchers;
/// Logging configuration and utilities
pub mod logging;
/// Ollama inference client
pub mod ollama;
/// Completion parsing
pub mod parser;
/// Prompt assembly under a size budget
pub mod prompt_builder;
/// Prompt templates
pub mod prompts;
/// Request, result and intermediate data types
pub mod types;
/// Utilities (input normalization, retry helpers)
pub mod utils;

// Re-export common types
pub use analyzer::Analyzer;
pub use config::Config;
pub use error::{AnalyzerError, Result};
pub use fetchers::{RepoLocation, RepoLocator};
pub use ollama::{CompletionModel, OllamaClient};
pub use types::{AnalysisRequest, AnalysisResult, FetchedContent, FetchedFile, HealthReport, Suggestions};
