//! Decoding configuration passed to the inference engine

/// Sampling settings for one batched generation call
#[derive(Debug, Clone, PartialEq)]
pub struct DecodingConfig {
    /// Sampling temperature
    pub temperature: f64,

    /// Nucleus-sampling threshold
    pub top_p: f64,

    /// Maximum number of generated tokens per completion
    pub max_tokens: u32,

    /// JSON Schema text constraining generation (guided decoding)
    pub guided_schema: Option<String>,
}

impl DecodingConfig {
    /// Attach a guided-decoding schema
    pub fn with_guided_schema(mut self, schema: impl Into<String>) -> Self {
        self.guided_schema = Some(schema.into());
        self
    }
}

impl Default for DecodingConfig {
    /// Low temperature for consistent ratings
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            max_tokens: 1024,
            guided_schema: None,
        }
    }
}
