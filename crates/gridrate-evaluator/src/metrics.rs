//! Progress accounting for a pipeline run

/// Counters collected during one run
///
/// `completed` starts at the number of input entries already in the store
/// and grows by one per persisted record or suppressed duplicate, so
/// `progress()` reports overall completion across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    /// Entries in the input word list
    pub total_words: usize,

    /// Input entries already present in the store at startup
    pub already_processed: usize,

    /// Entries left after filtering
    pub backlog: usize,

    /// Words whose completion was examined this run
    pub attempted: usize,

    /// Records appended this run
    pub persisted: usize,

    /// Words skipped because extraction failed
    pub skipped: usize,

    /// Backlog duplicates skipped because an earlier occurrence was persisted
    pub duplicates: usize,

    /// Inference round-trips completed
    pub batches: usize,

    /// Whether the run stopped on a cancellation signal
    pub interrupted: bool,
}

impl RunMetrics {
    /// Create metrics for a run over `total_words` entries
    pub fn new(total_words: usize, backlog: usize) -> Self {
        Self {
            total_words,
            already_processed: total_words.saturating_sub(backlog),
            backlog,
            ..Self::default()
        }
    }

    /// Entries done so far, counting earlier runs
    pub fn completed(&self) -> usize {
        self.already_processed + self.persisted + self.duplicates
    }

    /// Completion percentage in [0, 100]
    pub fn progress(&self) -> f64 {
        if self.total_words == 0 {
            return 100.0;
        }
        (self.completed() as f64 / self.total_words as f64) * 100.0
    }

    /// Record a persisted evaluation
    pub fn record_persisted(&mut self) {
        self.attempted += 1;
        self.persisted += 1;
    }

    /// Record a word skipped on extraction failure
    pub fn record_skipped(&mut self) {
        self.attempted += 1;
        self.skipped += 1;
    }

    /// Record a duplicate suppressed at persist time
    pub fn record_duplicate(&mut self) {
        self.attempted += 1;
        self.duplicates += 1;
    }

    /// Record a finished inference round-trip
    pub fn record_batch(&mut self) {
        self.batches += 1;
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Evaluation Run Summary".to_string(),
            "======================".to_string(),
            format!("Total words: {}", self.total_words),
            format!("Already processed: {}", self.already_processed),
            format!("Backlog: {}", self.backlog),
            format!("Batches: {}", self.batches),
            format!("Attempted: {}", self.attempted),
            format!("Persisted: {}", self.persisted),
            format!("Skipped: {}", self.skipped),
        ];
        if self.duplicates > 0 {
            lines.push(format!("Duplicates: {}", self.duplicates));
        }
        lines.push(format!(
            "Progress: {}/{} ({:.2}%)",
            self.completed(),
            self.total_words,
            self.progress()
        ));
        if self.interrupted {
            lines.push("Run interrupted before the backlog was exhausted".to_string());
        }
        lines.join("\n")
    }
}
