//! Gridrate Evaluator
//!
//! Rates candidate words for crossword-grid suitability with an LLM and
//! persists validated ratings to an append-only store.
//!
//! # Architecture
//!
//! ```text
//! Word list → (minus processed set) → batches → PromptBuilder → InferenceGateway
//!           → ResponseExtractor + schema validation → ResultStore
//! ```
//!
//! # Key Features
//!
//! - **Resumable**: the processed set is rebuilt from the store at startup,
//!   so an interrupted run picks up where it stopped
//! - **Exactly-once recording**: one `word;rating` line per rated word
//! - **Contained failures**: malformed model output skips only that word
//! - **Single contract**: the schema shown to the model, sent as the
//!   guided-decoding constraint and used for validation is one object
//!
//! # Example Usage
//!
//! ```no_run
//! use gridrate_evaluator::{EvaluatorConfig, PipelineDriver};
//! use gridrate_llm::MockGateway;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = MockGateway::new(r#"{"word": "apple", "analysis": "common", "rating": 50}"#);
//! let mut driver = PipelineDriver::new(gateway, EvaluatorConfig::default())?;
//!
//! let metrics = driver.run().await?;
//! println!("{}", metrics.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod parser;
mod pipeline;
mod prompt;
mod schema;
mod source;
mod store;

pub use config::{DecodingSettings, EvaluatorConfig, ExtractionStrategy};
pub use error::{
    EvaluatorError, ExtractionCause, ExtractionError, SchemaValidationError, StoreError,
};
pub use metrics::RunMetrics;
pub use parser::{greedy_block, last_parsable_block, ResponseExtractor};
pub use pipeline::{CancellationFlag, PipelineDriver, PipelineState};
pub use prompt::PromptBuilder;
pub use schema::{to_json_schema, to_json_schema_string, validate};
pub use source::load_words;
pub use store::{load_processed, parse_record_word, ResultStore, RECORD_SEPARATOR};
