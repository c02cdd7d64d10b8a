//! Error types for Rapid Response.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },
}

/// Why a single sub-score could not come from the scoring model.
///
/// Never surfaced past the scorer: every variant resolves to the local
/// heuristic for that dimension.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("Scoring model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Scoring model returned no leading integer: {raw:?}")]
    Unparseable { raw: String },

    #[error("Scoring model returned {value}, outside 0-15")]
    OutOfRange { value: i64 },
}

/// Pipeline-related errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Issue record is missing required field: {field}")]
    InvalidIssue { field: &'static str },

    #[error("Unknown urgency level: {0}")]
    InvalidUrgency(String),

    #[error("Issue source {source_name} failed: {reason}")]
    SourceFetch { source_name: String, reason: String },
}
