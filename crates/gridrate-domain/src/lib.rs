//! Gridrate Domain Layer
//!
//! This crate contains the core domain model for Gridrate, a resumable
//! pipeline that rates candidate words for crossword-grid suitability.
//! It has ZERO external dependencies and defines the value objects and
//! trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Word**: a non-empty, trimmed token taken from the candidate list
//! - **WordEvaluation**: a word, the model's analysis and an integer rating in [10, 50]
//! - **EvaluationSchema**: the structured-output contract shown to the model and
//!   used to validate what comes back
//! - **DecodingConfig**: sampling settings handed to the inference engine
//! - **InferenceGateway**: the batch boundary to the external model engine
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure domain logic only
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decoding;
pub mod evaluation;
pub mod schema;
pub mod traits;

// Re-exports for convenience
pub use decoding::DecodingConfig;
pub use evaluation::{normalize_word, WordEvaluation};
pub use schema::{EvaluationSchema, FieldKind, FieldRole, FieldSpec, RATING_MAX, RATING_MIN};
pub use traits::InferenceGateway;
