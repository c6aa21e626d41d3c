//! Append-only result store and resume bookkeeping
//!
//! The store is a flat text file with one `word;rating` record per line.
//! It is the only source of truth for which words are already rated: the
//! processed set is rebuilt from it at the start of every run.

use crate::error::StoreError;
use gridrate_domain::WordEvaluation;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Field separator between word and rating
pub const RECORD_SEPARATOR: char = ';';

/// Append-only durable sink for validated evaluations
///
/// Appends are serialized through an internal lock so two writers never
/// interleave bytes, even though the default driver is single-threaded.
///
/// The lock also guards whether the file ends in an unterminated line left
/// by an earlier crash. [`ResultStore::load_processed`] records that, and
/// the next append starts with a newline so the new record gets its own line.
#[derive(Debug)]
pub struct ResultStore {
    path: PathBuf,
    sync_writes: bool,
    torn_tail: Mutex<bool>,
}

impl ResultStore {
    /// Create a store handle. The file is created on first append.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync_writes: true,
            torn_tail: Mutex::new(false),
        }
    }

    /// Enable or disable fsync after every append
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format one record line, including the trailing newline
    pub fn format_record(evaluation: &WordEvaluation) -> String {
        format!(
            "{}{}{}\n",
            evaluation.word(),
            RECORD_SEPARATOR,
            evaluation.rating()
        )
    }

    /// Append one record
    ///
    /// The whole line is handed to the OS in a single write while the
    /// store lock is held. The file is opened and closed per call.
    pub fn append(&self, evaluation: &WordEvaluation) -> Result<(), StoreError> {
        let record = Self::format_record(evaluation);
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let mut torn_tail = self.torn_tail.lock().map_err(|_| StoreError::LockPoisoned)?;
        let line = if *torn_tail {
            format!("\n{}", record)
        } else {
            record
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)?;
        *torn_tail = false;
        if self.sync_writes {
            file.sync_data().map_err(io_err)?;
        }

        debug!("Appended record for '{}'", evaluation.word());
        Ok(())
    }

    /// Rebuild the processed set from this store
    ///
    /// Also notes whether the file ends mid-line, so the next append does
    /// not glue its record onto the fragment.
    pub fn load_processed(&self) -> Result<HashSet<String>, StoreError> {
        let mut torn_tail = self.torn_tail.lock().map_err(|_| StoreError::LockPoisoned)?;
        let (processed, unterminated) = scan_store(&self.path)?;
        if unterminated {
            warn!("Store {} ends with an incomplete line", self.path.display());
        }
        *torn_tail = unterminated;
        Ok(processed)
    }
}

/// Rebuild the set of already-rated words from a store file
///
/// A missing file yields an empty set. Each line is split once on `;` and
/// the trimmed first field is taken as the word; lines without a separator
/// or with an empty word are skipped. A torn trailing line from a crash is
/// therefore either still a usable `word;` prefix or ignored.
pub fn load_processed<P: AsRef<Path>>(path: P) -> Result<HashSet<String>, StoreError> {
    scan_store(path.as_ref()).map(|(processed, _)| processed)
}

/// Processed set plus whether the file is non-empty without a final newline
fn scan_store(path: &Path) -> Result<(HashSet<String>, bool), StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok((HashSet::new(), false)),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let unterminated = bytes.last().is_some_and(|b| *b != b'\n');

    // Lossy decoding so a record cut inside a multi-byte character cannot fail the run
    let contents = String::from_utf8_lossy(&bytes);

    let processed = contents
        .lines()
        .filter_map(parse_record_word)
        .map(str::to_string)
        .collect();
    Ok((processed, unterminated))
}

/// Word field of one store line, if the line is a usable record
pub fn parse_record_word(line: &str) -> Option<&str> {
    let (word, _rating) = line.split_once(RECORD_SEPARATOR)?;
    let word = word.trim();
    (!word.is_empty()).then_some(word)
}
