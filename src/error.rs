use std::io;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur while analysing a repository
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The caller supplied something we cannot work with (bad URL, bad body)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The repository could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The inference endpoint did not answer within the configured timeout
    #[error("Model timed out after {0}s")]
    ModelTimeout(u64),

    /// The inference endpoint is unreachable or answered with an error
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The completion did not contain the expected structure
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// ZIP file processing errors
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal errors
    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl AnalyzerError {
    /// Creates a new internal error with the specified message
    pub fn new(message: &str) -> Self {
        Self::Internal(message.to_string())
    }

    /// Stable identifier reported in the `error` field of the API envelope
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::UrlParse(_) => "InvalidInputError",
            Self::Fetch(_) | Self::Zip(_) | Self::Walkdir(_) => "FetchError",
            Self::ModelTimeout(_) => "ModelTimeoutError",
            Self::ModelUnavailable(_) => "ModelUnavailableError",
            Self::Parse(_) => "ParseError",
            Self::Config(_) => "ConfigError",
            Self::IO(_) | Self::Json(_) | Self::Internal(_) => "InternalError",
        }
    }

    /// Checks if this error is transient and worth one more model attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ModelTimeout(_) | Self::ModelUnavailable(_))
    }

    /// True for failures caused by a system we call out to
    pub fn is_upstream(&self) -> bool {
        matches!(
            self.kind(),
            "FetchError" | "ModelTimeoutError" | "ModelUnavailableError"
        )
    }
}
