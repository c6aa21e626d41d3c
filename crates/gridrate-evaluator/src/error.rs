//! Error types for the evaluation pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Run-level errors. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum EvaluatorError {
    /// Input word list missing or unreadable
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Result store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Inference engine raised
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Inference engine returned a batch that cannot be aligned with its words
    #[error("Gateway returned {actual} completions for {expected} prompts")]
    GatewayShape {
        /// Number of prompts sent
        expected: usize,
        /// Number of completions received
        actual: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by the result store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or appending failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Store file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The write guard was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// A payload that does not satisfy the evaluation schema
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Schema validation failed: {reason}")]
pub struct SchemaValidationError {
    /// The JSON text that was validated
    pub payload: String,
    /// What was wrong with it
    pub reason: String,
}

/// Why a completion could not be turned into an evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionCause {
    /// No `{ ... }` block in the completion
    #[error("no JSON object found")]
    NoJsonObject,

    /// The located block is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The JSON does not satisfy the schema
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    /// The model rated a different word than the one it was asked about
    #[error("expected word '{expected}', model answered for '{found}'")]
    WordMismatch {
        /// Word from the backlog
        expected: String,
        /// Word in the model output
        found: String,
    },
}

/// Per-word extraction failure, carrying the raw completion
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unable to parse JSON data from response: {cause}")]
pub struct ExtractionError {
    /// The raw completion text
    pub raw: String,
    /// Underlying cause
    pub cause: ExtractionCause,
}

impl ExtractionError {
    pub(crate) fn new(raw: &str, cause: impl Into<ExtractionCause>) -> Self {
        Self {
            raw: raw.to_string(),
            cause: cause.into(),
        }
    }
}
