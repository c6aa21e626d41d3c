//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::DecodingConfig;

/// Trait for the external text-generation engine
///
/// Implemented by the infrastructure layer (gridrate-llm). The engine is
/// expensive, process-wide state, so callers construct it once and inject
/// it; tests substitute a stub.
pub trait InferenceGateway {
    /// Error type for gateway operations
    type Error;

    /// Generate one completion per prompt
    ///
    /// Implementations must return exactly `prompts.len()` completions in
    /// input order. The call is synchronous and covers the whole batch.
    fn generate_batch(
        &self,
        prompts: &[String],
        decoding: &DecodingConfig,
    ) -> Result<Vec<String>, Self::Error>;

    /// Name of the model behind this gateway, for logging
    fn model_name(&self) -> &str {
        "llm"
    }
}
