//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Inference gateway could not be built
    #[error("Gateway error: {0}")]
    Gateway(#[from] gridrate_llm::LlmError),

    /// Fatal pipeline error
    #[error(transparent)]
    Evaluator(#[from] gridrate_evaluator::EvaluatorError),
}
