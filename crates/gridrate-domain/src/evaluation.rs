//! Word evaluation value object

use crate::schema::{RATING_MAX, RATING_MIN};

/// Characters that can never appear in a persisted word.
///
/// The result store is a flat `word;rating` line format without escaping.
pub const FORBIDDEN_WORD_CHARS: [char; 3] = [';', '\n', '\r'];

/// Normalize a raw token into a word.
///
/// Returns `None` for blank input. Equality between words is exact string
/// match after trimming, so no case folding happens here.
pub fn normalize_word(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// A validated rating of one candidate word
///
/// Instances can only be built through [`WordEvaluation::new`], which
/// enforces the rating range and the word format. A value of this type is
/// therefore always safe to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEvaluation {
    word: String,
    analysis: String,
    rating: i64,
}

impl WordEvaluation {
    /// Create a new evaluation
    ///
    /// # Errors
    /// Returns a description of the violated rule when the word is empty,
    /// contains a record separator, or the rating lies outside [10, 50].
    /// Out-of-range ratings are rejected, never clamped.
    pub fn new(
        word: impl Into<String>,
        analysis: impl Into<String>,
        rating: i64,
    ) -> Result<Self, String> {
        let word = word.into();
        let word = word.trim().to_string();

        if word.is_empty() {
            return Err("word is empty".to_string());
        }
        if let Some(c) = word.chars().find(|c| FORBIDDEN_WORD_CHARS.contains(c)) {
            return Err(format!("word contains forbidden character {:?}", c));
        }
        if !(RATING_MIN..=RATING_MAX).contains(&rating) {
            return Err(format!(
                "rating {} out of range [{}, {}]",
                rating, RATING_MIN, RATING_MAX
            ));
        }

        Ok(Self {
            word,
            analysis: analysis.into(),
            rating,
        })
    }

    /// The evaluated word
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Free-text reasoning produced by the model
    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    /// The quality rating, always within [10, 50]
    pub fn rating(&self) -> i64 {
        self.rating
    }
}
