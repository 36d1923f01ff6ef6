mod env_manager;

use crate::error::{AnalyzerError, Result};
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use env_manager::*;

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "codellama";
const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Main configuration struct for the application
///
/// Settings are layered: built-in defaults, then an optional TOML file,
/// then environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Socket address the HTTP server listens on
    pub bind_addr: String,
    /// Inference endpoint settings
    pub ollama: OllamaSettings,
    /// Repository ingestion settings
    pub ingest: IngestSettings,
    /// Prompt size budget in characters
    pub max_prompt_chars: usize,
    /// Attach the repository health report to every result
    pub report_health: bool,
    /// GitHub API token for authenticated requests
    #[serde(skip_serializing)]
    pub github_token: Option<String>,
}

/// Settings for the Ollama inference endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    /// Base URL, e.g. `http://localhost:11434`
    pub host: String,
    /// Model identifier passed with every request
    pub model: String,
    /// Whole-request timeout for one model call
    pub timeout_secs: u64,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Retries after a transient failure; anything above 1 is treated as 1
    pub retries: u32,
}

/// How a repository gets pulled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStrategy {
    /// GitHub REST API, file by file
    Api,
    /// GitHub zipball, extracted to a temporary directory
    Archive,
    /// Shallow `git clone` into a temporary directory
    Clone,
}

/// Settings controlling which files are pulled from a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Ingestion mechanism for remote repositories
    pub strategy: IngestStrategy,
    /// Maximum number of files kept after ranking
    pub max_files: usize,
    /// Per-file character cap
    pub max_file_chars: usize,
    /// GitHub REST API base URL
    pub github_api_base: String,
    /// Timeout for each fetch request, in seconds
    pub fetch_timeout_secs: u64,
    /// Regex patterns for paths to exclude
    pub excluded_files: Vec<String>,
    /// Accept `file://` URLs, reading from this machine's disk
    pub allow_local_paths: bool,
    /// Largest zipball the archive strategy will download, in bytes
    pub max_archive_bytes: u64,
}

impl Config {
    /// Loads configuration from `path`, or from the default config file
    /// location when `path` is `None`, then applies environment overrides.
    ///
    /// A missing default config file is not an error; a missing explicit
    /// path is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(get_env_value)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| AnalyzerError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// `<config_dir>/repo-analyzer/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("repo-analyzer").join("config.toml"))
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production, a map in tests)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(OLLAMA_HOST) {
            self.ollama.host = host.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup(OLLAMA_MODEL) {
            self.ollama.model = model.trim().to_string();
        }
        if let Some(raw) = lookup(OLLAMA_TIMEOUT_SECS) {
            self.ollama.timeout_secs = parse_env_value(OLLAMA_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(OLLAMA_MAX_TOKENS) {
            self.ollama.max_tokens = parse_env_value(OLLAMA_MAX_TOKENS, &raw)?;
        }
        if let Some(raw) = lookup(OLLAMA_RETRIES) {
            self.ollama.retries = parse_env_value(OLLAMA_RETRIES, &raw)?;
        }
        if let Some(raw) = lookup(ANALYZER_MAX_PROMPT_CHARS) {
            self.max_prompt_chars = parse_env_value(ANALYZER_MAX_PROMPT_CHARS, &raw)?;
        }
        if let Some(raw) = lookup(ANALYZER_MAX_FILES) {
            self.ingest.max_files = parse_env_value(ANALYZER_MAX_FILES, &raw)?;
        }
        if let Some(raw) = lookup(ANALYZER_MAX_FILE_CHARS) {
            self.ingest.max_file_chars = parse_env_value(ANALYZER_MAX_FILE_CHARS, &raw)?;
        }
        if let Some(raw) = lookup(ANALYZER_INGEST_STRATEGY) {
            self.ingest.strategy = parse_env_value(ANALYZER_INGEST_STRATEGY, &raw)?;
        }
        if let Some(addr) = lookup(ANALYZER_BIND_ADDR) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(raw) = lookup(ANALYZER_ALLOW_LOCAL_PATHS) {
            self.ingest.allow_local_paths = parse_env_flag(ANALYZER_ALLOW_LOCAL_PATHS, &raw)?;
        }
        if let Some(raw) = lookup(ANALYZER_REPORT_HEALTH) {
            self.report_health = parse_env_flag(ANALYZER_REPORT_HEALTH, &raw)?;
        }
        if let Some(token) = lookup(GITHUB_TOKEN) {
            self.github_token = Some(token.trim().to_string());
        }
        if let Some(base) = lookup(GITHUB_API_BASE_URL) {
            self.ingest.github_api_base = base.trim().trim_end_matches('/').to_string();
        }
        Ok(())
    }

    /// Rejects settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.ollama.host.trim().is_empty() {
            return Err(AnalyzerError::Config("ollama.host must not be empty".into()));
        }
        url::Url::parse(&self.ollama.host)
            .map_err(|e| AnalyzerError::Config(format!("ollama.host is not a URL: {}", e)))?;
        if self.ollama.model.trim().is_empty() {
            return Err(AnalyzerError::Config("ollama.model must not be empty".into()));
        }
        if self.ollama.timeout_secs == 0 {
            return Err(AnalyzerError::Config("ollama.timeout_secs must be positive".into()));
        }
        if self.max_prompt_chars == 0 {
            return Err(AnalyzerError::Config("max_prompt_chars must be positive".into()));
        }
        if self.ingest.max_files == 0 || self.ingest.max_file_chars == 0 {
            return Err(AnalyzerError::Config(
                "ingest.max_files and ingest.max_file_chars must be positive".into(),
            ));
        }
        if self.ingest.max_archive_bytes == 0 {
            return Err(AnalyzerError::Config("ingest.max_archive_bytes must be positive".into()));
        }
        self.exclusion_set()?;
        if let Some(token) = &self.github_token {
            if token.trim().is_empty() {
                return Err(AnalyzerError::Config("GitHub token is empty".into()));
            }
        }
        Ok(())
    }

    /// Effective number of retries for the model call
    pub fn model_retries(&self) -> u32 {
        self.ollama.retries.min(1)
    }

    /// Compiles the exclusion patterns into one matcher
    pub fn exclusion_set(&self) -> Result<RegexSet> {
        RegexSet::new(&self.ingest.excluded_files)
            .map_err(|e| AnalyzerError::Config(format!("Invalid exclusion pattern: {}", e)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            ollama: OllamaSettings::default(),
            ingest: IngestSettings::default(),
            max_prompt_chars: 15_000,
            report_health: false,
            github_token: None,
        }
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout_secs: 180,
            max_tokens: 1024,
            temperature: 0.2,
            retries: 0,
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            strategy: IngestStrategy::Api,
            max_files: 20,
            max_file_chars: 4_000,
            github_api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            fetch_timeout_secs: 30,
            excluded_files: vec![r"\.env".to_string(), r"\.min\.js$".to_string()],
            allow_local_paths: false,
            max_archive_bytes: 100 * 1024 * 1024,
        }
    }
}

impl FromStr for IngestStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "archive" | "zip" => Ok(Self::Archive),
            "clone" | "git" => Ok(Self::Clone),
            other => Err(format!("unknown ingest strategy '{}' (expected api, archive or clone)", other)),
        }
    }
}

impl fmt::Display for IngestStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Archive => write!(f, "archive"),
            Self::Clone => write!(f, "clone"),
        }
    }
}
