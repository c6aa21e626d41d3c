//! Pull a schema-conformant evaluation out of raw LLM output

use crate::config::ExtractionStrategy;
use crate::error::{ExtractionCause, ExtractionError};
use crate::schema::validate;
use gridrate_domain::{EvaluationSchema, WordEvaluation};
use serde_json::Value;

/// Extracts and validates one evaluation per completion
pub struct ResponseExtractor<'a> {
    schema: &'a EvaluationSchema,
    strategy: ExtractionStrategy,
}

impl<'a> ResponseExtractor<'a> {
    /// Create an extractor bound to a contract
    pub fn new(schema: &'a EvaluationSchema, strategy: ExtractionStrategy) -> Self {
        Self { schema, strategy }
    }

    /// Extract an evaluation from raw completion text
    ///
    /// Never returns a partially-valid record: any failure yields an
    /// [`ExtractionError`] carrying the raw text.
    pub fn extract(&self, raw: &str) -> Result<WordEvaluation, ExtractionError> {
        let block = match self.strategy {
            ExtractionStrategy::Greedy => greedy_block(raw),
            ExtractionStrategy::LastObject => last_parsable_block(raw),
        }
        .ok_or_else(|| ExtractionError::new(raw, ExtractionCause::NoJsonObject))?;

        let value: Value = serde_json::from_str(block)
            .map_err(|e| ExtractionError::new(raw, ExtractionCause::InvalidJson(e.to_string())))?;

        validate(self.schema, &value).map_err(|e| ExtractionError::new(raw, e))
    }

    /// Extract an evaluation and require it to be about `word`
    pub fn extract_for(&self, word: &str, raw: &str) -> Result<WordEvaluation, ExtractionError> {
        let evaluation = self.extract(raw)?;
        if evaluation.word() != word {
            return Err(ExtractionError::new(
                raw,
                ExtractionCause::WordMismatch {
                    expected: word.to_string(),
                    found: evaluation.word().to_string(),
                },
            ));
        }
        Ok(evaluation)
    }
}

/// Span from the first `{` through the last `}`
///
/// Several objects in one completion get merged into one span, which then
/// fails to parse.
pub fn greedy_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// The last balanced `{ ... }` span that parses as JSON
///
/// Braces inside JSON strings are ignored while balancing. Falls back to
/// the last balanced span when none parses, so the caller reports the
/// parse error of the final object.
pub fn last_parsable_block(raw: &str) -> Option<&str> {
    let spans = balanced_spans(raw);
    spans
        .iter()
        .rev()
        .map(|&(s, e)| &raw[s..e])
        .find(|block| serde_json::from_str::<Value>(block).is_ok())
        .or_else(|| spans.last().map(|&(s, e)| &raw[s..e]))
}

/// Top-level balanced brace spans as byte ranges
fn balanced_spans(raw: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in raw.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push((start, idx + 1));
                }
            }
            _ => {}
        }
    }

    spans
}
