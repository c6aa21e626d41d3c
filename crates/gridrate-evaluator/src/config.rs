//! Configuration for the evaluation pipeline

use gridrate_domain::DecodingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the JSON object is located inside a raw completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Span from the first `{` to the last `}`
    #[default]
    Greedy,
    /// The last balanced `{ ... }` block that parses as JSON
    LastObject,
}

/// Sampling settings as they appear in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodingSettings {
    /// Sampling temperature
    pub temperature: f64,

    /// Nucleus-sampling threshold
    pub top_p: f64,

    /// Maximum generated tokens per completion
    pub max_tokens: u32,

    /// Constrain generation with the evaluation schema
    #[serde(default = "default_true")]
    pub guided: bool,
}

impl Default for DecodingSettings {
    fn default() -> Self {
        let defaults = DecodingConfig::default();
        Self {
            temperature: defaults.temperature,
            top_p: defaults.top_p,
            max_tokens: defaults.max_tokens,
            guided: true,
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Candidate word list, one word per line
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    /// Append-only result store
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Words per inference call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// JSON block location strategy
    #[serde(default)]
    pub extraction_strategy: ExtractionStrategy,

    /// fsync the store after every append
    #[serde(default = "default_true")]
    pub sync_writes: bool,

    /// Sampling settings
    #[serde(default)]
    pub decoding: DecodingSettings,
}

fn default_input_path() -> PathBuf {
    PathBuf::from("wordlist.txt")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("results.csv")
}

fn default_batch_size() -> usize {
    32
}

fn default_true() -> bool {
    true
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
            batch_size: default_batch_size(),
            extraction_strategy: ExtractionStrategy::default(),
            sync_writes: true,
            decoding: DecodingSettings::default(),
        }
    }
}

impl EvaluatorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.decoding.temperature) {
            return Err(format!(
                "temperature {} out of range [0.0, 2.0]",
                self.decoding.temperature
            ));
        }
        if !(self.decoding.top_p > 0.0 && self.decoding.top_p <= 1.0) {
            return Err(format!("top_p {} out of range (0.0, 1.0]", self.decoding.top_p));
        }
        if self.decoding.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.input_path.as_os_str().is_empty() {
            return Err("input_path must not be empty".to_string());
        }
        if self.output_path.as_os_str().is_empty() {
            return Err("output_path must not be empty".to_string());
        }
        Ok(())
    }

    /// Decoding configuration without the guided schema attached
    pub fn decoding_config(&self) -> DecodingConfig {
        DecodingConfig {
            temperature: self.decoding.temperature,
            top_p: self.decoding.top_p,
            max_tokens: self.decoding.max_tokens,
            guided_schema: None,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&contents)
    }
}
