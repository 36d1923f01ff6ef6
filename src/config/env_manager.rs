use crate::error::{AnalyzerError, Result};
use std::str::FromStr;

/// Environment variable naming the inference endpoint base URL
pub const OLLAMA_HOST: &str = "OLLAMA_HOST";
/// Environment variable naming the model identifier
pub const OLLAMA_MODEL: &str = "OLLAMA_MODEL";
/// Request timeout for the model call, in seconds
pub const OLLAMA_TIMEOUT_SECS: &str = "OLLAMA_TIMEOUT_SECS";
/// Upper bound on generated tokens (`num_predict`)
pub const OLLAMA_MAX_TOKENS: &str = "OLLAMA_MAX_TOKENS";
/// Number of retries for the model call (0 or 1)
pub const OLLAMA_RETRIES: &str = "OLLAMA_RETRIES";
/// Prompt size budget in characters
pub const ANALYZER_MAX_PROMPT_CHARS: &str = "ANALYZER_MAX_PROMPT_CHARS";
/// Maximum number of files pulled from a repository
pub const ANALYZER_MAX_FILES: &str = "ANALYZER_MAX_FILES";
/// Per-file character cap
pub const ANALYZER_MAX_FILE_CHARS: &str = "ANALYZER_MAX_FILE_CHARS";
/// `api`, `archive` or `clone`
pub const ANALYZER_INGEST_STRATEGY: &str = "ANALYZER_INGEST_STRATEGY";
/// Socket address the HTTP server binds to
pub const ANALYZER_BIND_ADDR: &str = "ANALYZER_BIND_ADDR";
/// Accept `file://` repository URLs
pub const ANALYZER_ALLOW_LOCAL_PATHS: &str = "ANALYZER_ALLOW_LOCAL_PATHS";
/// Include the repository health report in results
pub const ANALYZER_REPORT_HEALTH: &str = "ANALYZER_REPORT_HEALTH";
/// GitHub API token for authenticated requests
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// GitHub API base URL, overridable for tests and GitHub Enterprise
pub const GITHUB_API_BASE_URL: &str = "GITHUB_API_BASE_URL";

/// Reads an environment variable, treating empty values as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parses a looked-up value, reporting the variable name on failure
pub fn parse_env_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        AnalyzerError::Config(format!("{} has invalid value '{}': {}", key, raw, e))
    })
}

/// Interprets the usual spellings of a boolean flag
pub fn parse_env_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AnalyzerError::Config(format!(
            "{} has invalid value '{}': expected true or false",
            key, other
        ))),
    }
}
