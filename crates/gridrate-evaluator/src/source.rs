//! Candidate word list loading

use crate::error::EvaluatorError;
use gridrate_domain::normalize_word;
use std::path::Path;

/// Load the candidate words, one per line
///
/// Lines are trimmed and blank lines dropped. Order and duplicates are kept.
pub fn load_words<P: AsRef<Path>>(path: P) -> Result<Vec<String>, EvaluatorError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| EvaluatorError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(contents
        .lines()
        .filter_map(normalize_word)
        .map(str::to_string)
        .collect())
}
