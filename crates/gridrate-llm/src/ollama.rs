//! Ollama Gateway Implementation
//!
//! Provides integration with Ollama's local LLM API.
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama generate API
//! - Structured outputs: the guided-decoding schema is sent as `format`
//! - Sampling options mapped from [`DecodingConfig`]
//! - Retry logic with exponential backoff
//! - Configurable request timeout
//!
//! # Examples
//!
//! ```no_run
//! use gridrate_llm::OllamaGateway;
//!
//! let gateway = OllamaGateway::new("http://localhost:11434", "qwen2.5:1.5b-instruct").unwrap();
//! ```

use crate::LlmError;
use gridrate_domain::{DecodingConfig, InferenceGateway};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for a single completion (5 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default number of attempts per prompt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API gateway for local LLM inference
pub struct OllamaGateway {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
    top_p: f64,
    num_predict: u32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaGateway {
    /// Create a new Ollama gateway
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "qwen2.5:1.5b-instruct")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new Ollama gateway with a custom request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        // Each batch runs on its own short-lived runtime, so pooled
        // connections must not outlive it.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the maximum number of attempts per prompt
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Generate one completion
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - The guided schema is not valid JSON
    /// - Response format is invalid
    pub async fn generate(&self, prompt: &str, decoding: &DecodingConfig) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let format = decoding
            .guided_schema
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|e| LlmError::InvalidRequest(format!("Guided schema is not JSON: {}", e)))?;

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
            options: OllamaOptions {
                temperature: decoding.temperature,
                top_p: decoding.top_p,
                num_predict: decoding.max_tokens,
            },
        };

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return response
                            .json::<OllamaGenerateResponse>()
                            .await
                            .map(|r| r.response)
                            .map_err(|e| {
                                LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                            });
                    } else if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else {
                        let status = response.status();
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!("Ollama request failed, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }

    /// Generate completions for a batch, in order
    ///
    /// Ollama's generate endpoint takes one prompt per request, so prompts
    /// are sent one after another. Any failure fails the whole batch.
    pub async fn generate_all(
        &self,
        prompts: &[String],
        decoding: &DecodingConfig,
    ) -> Result<Vec<String>, LlmError> {
        let mut completions = Vec::with_capacity(prompts.len());
        for (idx, prompt) in prompts.iter().enumerate() {
            debug!("Generating completion {}/{}", idx + 1, prompts.len());
            completions.push(self.generate(prompt, decoding).await?);
        }
        Ok(completions)
    }
}

impl InferenceGateway for OllamaGateway {
    type Error = LlmError;

    fn generate_batch(
        &self,
        prompts: &[String],
        decoding: &DecodingConfig,
    ) -> Result<Vec<String>, Self::Error> {
        // Blocking wrapper for async function
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Runtime(e.to_string()))?
            .block_on(self.generate_all(prompts, decoding))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
