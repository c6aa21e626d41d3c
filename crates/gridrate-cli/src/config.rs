//! Configuration file handling for the CLI.
//!
//! A config file has an `[evaluator]` table (pipeline settings) and a
//! `[gateway]` table (where completions come from). Every key is optional.
//! Command-line flags override file values.

use crate::cli::Cli;
use crate::error::{CliError, Result};
use gridrate_evaluator::EvaluatorConfig;
use gridrate_llm::{DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default model served for rating
pub const DEFAULT_MODEL: &str = "qwen2.5:1.5b-instruct";

/// Where completions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Canned response, no model involved
    Mock,
}

/// Inference gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider
    #[serde(default)]
    pub provider: Provider,

    /// Server URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Attempts per prompt before the batch fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Completion returned by the mock provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            mock_response: None,
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Pipeline settings
    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    /// Gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from a file, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    CliError::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&contents)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(input) = &cli.input {
            self.evaluator.input_path = input.clone();
        }
        if let Some(output) = &cli.output {
            self.evaluator.output_path = output.clone();
        }
        if let Some(batch_size) = cli.batch_size {
            self.evaluator.batch_size = batch_size;
        }
        if let Some(strategy) = cli.strategy {
            self.evaluator.extraction_strategy = strategy.into();
        }
        if let Some(model) = &cli.model {
            self.gateway.model = model.clone();
        }
        if let Some(endpoint) = &cli.endpoint {
            self.gateway.endpoint = endpoint.clone();
        }
        if let Some(response) = &cli.mock_response {
            self.gateway.provider = Provider::Mock;
            self.gateway.mock_response = Some(response.clone());
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.evaluator.validate().map_err(CliError::Config)?;
        if self.gateway.provider == Provider::Ollama {
            if self.gateway.endpoint.trim().is_empty() {
                return Err(CliError::Config("endpoint must not be empty".into()));
            }
            if self.gateway.model.trim().is_empty() {
                return Err(CliError::Config("model must not be empty".into()));
            }
            if self.gateway.timeout_secs == 0 {
                return Err(CliError::Config("timeout_secs must be greater than 0".into()));
            }
        }
        Ok(())
    }
}
