//! Gridrate Inference Gateway Layer
//!
//! Pluggable implementations of the `InferenceGateway` trait from `gridrate-domain`.
//!
//! # Gateways
//!
//! - `MockGateway`: Deterministic mock for testing
//! - `OllamaGateway`: Local Ollama API integration with structured outputs
//!
//! # Examples
//!
//! ```
//! use gridrate_llm::MockGateway;
//! use gridrate_domain::{DecodingConfig, InferenceGateway};
//!
//! let gateway = MockGateway::new("Hello from LLM!");
//! let prompts = vec!["a".to_string(), "b".to_string()];
//! let result = gateway.generate_batch(&prompts, &DecodingConfig::default()).unwrap();
//! assert_eq!(result, vec!["Hello from LLM!", "Hello from LLM!"]);
//! ```

#![warn(missing_docs)]

pub mod ollama;

use gridrate_domain::{DecodingConfig, InferenceGateway};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub use ollama::{OllamaGateway, DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built (bad schema, bad settings)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Async runtime could not be created
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

const ERROR_MARKER: &str = "ERROR";

/// Mock inference gateway for deterministic testing
///
/// Returns pre-configured completions without making any network calls.
/// Responses are keyed by the exact prompt text; unknown prompts receive
/// the default response.
///
/// # Examples
///
/// ```
/// use gridrate_llm::MockGateway;
/// use gridrate_domain::{DecodingConfig, InferenceGateway};
///
/// let mut gateway = MockGateway::default();
/// gateway.add_response("prompt1", "response1");
/// gateway.add_response("prompt2", "response2");
///
/// let prompts = vec!["prompt2".to_string(), "prompt1".to_string()];
/// let out = gateway.generate_batch(&prompts, &DecodingConfig::default()).unwrap();
/// assert_eq!(out, vec!["response2", "response1"]);
/// assert_eq!(gateway.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockGateway {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    batch_sizes: Arc<Mutex<Vec<usize>>>,
    last_decoding: Arc<Mutex<Option<DecodingConfig>>>,
}

impl MockGateway {
    /// Create a new MockGateway with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
            last_decoding: Arc::new(Mutex::new(None)),
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(prompt.into(), response.into());
    }

    /// Configure the whole batch to fail when it contains this prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.add_response(prompt, ERROR_MARKER);
    }

    /// Number of batch calls made so far
    pub fn call_count(&self) -> usize {
        self.batch_sizes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Total number of prompts received across all calls
    pub fn prompt_count(&self) -> usize {
        self.batch_sizes.lock().unwrap_or_else(PoisonError::into_inner).iter().sum()
    }

    /// Size of every batch received, in call order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Decoding configuration of the most recent call
    pub fn last_decoding(&self) -> Option<DecodingConfig> {
        self.last_decoding.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Reset the recorded calls
    pub fn reset_calls(&self) {
        self.batch_sizes.lock().unwrap_or_else(PoisonError::into_inner).clear();
        *self.last_decoding.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl InferenceGateway for MockGateway {
    type Error = LlmError;

    fn generate_batch(
        &self,
        prompts: &[String],
        decoding: &DecodingConfig,
    ) -> Result<Vec<String>, Self::Error> {
        self.batch_sizes
            .lock()
            .map_err(|e| LlmError::Other(e.to_string()))?
            .push(prompts.len());
        *self
            .last_decoding
            .lock()
            .map_err(|e| LlmError::Other(e.to_string()))? = Some(decoding.clone());

        let responses = self
            .responses
            .lock()
            .map_err(|e| LlmError::Other(e.to_string()))?;

        prompts
            .iter()
            .map(|prompt| match responses.get(prompt) {
                Some(response) if response == ERROR_MARKER => {
                    Err(LlmError::Other("Mock error".to_string()))
                }
                Some(response) => Ok(response.clone()),
                None => Ok(self.default_response.clone()),
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
