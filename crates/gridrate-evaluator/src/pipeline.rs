//! Pipeline driver: load, filter, batch, infer, extract, persist

use crate::config::EvaluatorConfig;
use crate::error::EvaluatorError;
use crate::metrics::RunMetrics;
use crate::parser::ResponseExtractor;
use crate::prompt::PromptBuilder;
use crate::schema::to_json_schema;
use crate::source::load_words;
use crate::store::ResultStore;
use gridrate_domain::{DecodingConfig, EvaluationSchema, InferenceGateway};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

/// Driver states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started
    Idle,
    /// Reading the word list and the processed set
    Loading,
    /// Removing already-rated words from the list
    Filtering,
    /// Carving the next batch from the backlog
    BatchReady,
    /// Waiting on the inference engine
    Inferring,
    /// Turning completions into evaluations
    Extracting,
    /// Appending a record to the store
    Persisting,
    /// Backlog exhausted
    Done,
    /// Stopped on a cancellation signal
    Interrupted,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Loading => "loading",
            PipelineState::Filtering => "filtering",
            PipelineState::BatchReady => "batch_ready",
            PipelineState::Inferring => "inferring",
            PipelineState::Extracting => "extracting",
            PipelineState::Persisting => "persisting",
            PipelineState::Done => "done",
            PipelineState::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation signal shared between the driver and its owner
///
/// The driver checks it at batch and word boundaries, and stops waiting on
/// an in-flight inference call. It is never observed in the middle of an
/// append.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<CancelInner>,
}

impl CancellationFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation is requested
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Orchestrates one evaluation run over the backlog
pub struct PipelineDriver<G>
where
    G: InferenceGateway,
{
    gateway: Arc<G>,
    store: ResultStore,
    schema: EvaluationSchema,
    config: EvaluatorConfig,
    cancel: CancellationFlag,
    state: PipelineState,
    last_metrics: Option<RunMetrics>,
}

impl<G> PipelineDriver<G>
where
    G: InferenceGateway + Send + Sync + 'static,
    G::Error: fmt::Display,
{
    /// Create a new driver
    ///
    /// # Errors
    /// Returns [`EvaluatorError::Config`] if the configuration is invalid.
    pub fn new(gateway: G, config: EvaluatorConfig) -> Result<Self, EvaluatorError> {
        config.validate().map_err(EvaluatorError::Config)?;
        let store = ResultStore::new(&config.output_path).with_sync_writes(config.sync_writes);

        Ok(Self {
            gateway: Arc::new(gateway),
            store,
            schema: EvaluationSchema::word_evaluation(),
            config,
            cancel: CancellationFlag::new(),
            state: PipelineState::Idle,
            last_metrics: None,
        })
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle to this driver's cancellation flag
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Metrics of the most recent run, including one that failed
    pub fn last_metrics(&self) -> Option<&RunMetrics> {
        self.last_metrics.as_ref()
    }

    /// The result store this driver appends to
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Decoding configuration sent with every batch
    ///
    /// When guided decoding is enabled the constraint is rendered from the
    /// same contract the extractor validates against.
    pub fn decoding_config(&self) -> DecodingConfig {
        let decoding = self.config.decoding_config();
        if self.config.decoding.guided {
            decoding.with_guided_schema(to_json_schema(&self.schema).to_string())
        } else {
            decoding
        }
    }

    /// Run the pipeline until the backlog is exhausted or cancellation
    ///
    /// Per-word extraction failures are logged and skipped. Input, store and
    /// gateway failures abort the run; every record appended before the
    /// failure stays durable.
    pub async fn run(&mut self) -> Result<RunMetrics, EvaluatorError> {
        self.transition(PipelineState::Loading);
        let words = load_words(&self.config.input_path)?;
        let processed = self.store.load_processed()?;
        info!(
            "Total words to evaluate: {}. Already processed: {}.",
            words.len(),
            processed.len()
        );

        self.transition(PipelineState::Filtering);
        let backlog: Vec<String> = words
            .iter()
            .filter(|w| !processed.contains(w.as_str()))
            .cloned()
            .collect();
        let mut metrics = RunMetrics::new(words.len(), backlog.len());
        info!("Words left to process: {}.", backlog.len());

        let schema = self.schema.clone();
        let prompts = PromptBuilder::new(&schema);
        let extractor = ResponseExtractor::new(&schema, self.config.extraction_strategy);
        let decoding = self.decoding_config();
        let batch_count = backlog.len().div_ceil(self.config.batch_size);
        let mut persisted_this_run: HashSet<&str> = HashSet::new();

        info!(
            "Using model '{}' with batch size {}",
            self.gateway.model_name(),
            self.config.batch_size
        );

        for (batch_idx, batch) in backlog.chunks(self.config.batch_size).enumerate() {
            self.transition(PipelineState::BatchReady);
            if self.cancel.is_cancelled() {
                return Ok(self.interrupt(metrics));
            }
            info!(
                "Processing batch {}/{} ({} words)",
                batch_idx + 1,
                batch_count,
                batch.len()
            );

            self.transition(PipelineState::Inferring);
            let inferred = tokio::select! {
                result = self.infer(prompts.build_batch(batch), &decoding) => result,
                _ = self.cancel.cancelled() => return Ok(self.interrupt(metrics)),
            };
            let completions = match inferred {
                Ok(completions) => completions,
                Err(e) => return Err(self.abort(metrics, e)),
            };
            metrics.record_batch();

            self.transition(PipelineState::Extracting);
            for (word, completion) in batch.iter().zip(&completions) {
                if self.cancel.is_cancelled() {
                    return Ok(self.interrupt(metrics));
                }

                let raw = completion.trim();
                debug!("Raw model output for '{}':\n{}", word, raw);

                if persisted_this_run.contains(word.as_str()) {
                    debug!("'{}' already persisted in this run, skipping duplicate", word);
                    metrics.record_duplicate();
                    continue;
                }

                let evaluation = match extractor.extract_for(word, raw) {
                    Ok(evaluation) => evaluation,
                    Err(e) => {
                        warn!(raw = %e.raw, "Error processing word '{}': {}", word, e);
                        metrics.record_skipped();
                        continue;
                    }
                };
                debug!(
                    "Extracted data - Word: {}, Rating: {}",
                    evaluation.word(),
                    evaluation.rating()
                );

                self.transition(PipelineState::Persisting);
                if let Err(e) = self.store.append(&evaluation) {
                    return Err(self.abort(metrics, e.into()));
                }
                persisted_this_run.insert(word.as_str());
                metrics.record_persisted();
                info!(
                    "Progress: {}/{} ({:.2}%)",
                    metrics.completed(),
                    metrics.total_words,
                    metrics.progress()
                );
                self.transition(PipelineState::Extracting);
            }
        }

        self.transition(PipelineState::Done);
        info!("{}", metrics.summary());
        self.last_metrics = Some(metrics.clone());
        Ok(metrics)
    }

    /// One batched gateway call, run off the async executor
    async fn infer(
        &self,
        prompts: Vec<String>,
        decoding: &DecodingConfig,
    ) -> Result<Vec<String>, EvaluatorError> {
        let expected = prompts.len();
        let gateway = Arc::clone(&self.gateway);
        let decoding = decoding.clone();

        // Call in a blocking context since InferenceGateway is not async
        let completions = tokio::task::spawn_blocking(move || {
            gateway
                .generate_batch(&prompts, &decoding)
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| EvaluatorError::Gateway(format!("Task join error: {}", e)))?
        .map_err(EvaluatorError::Gateway)?;

        if completions.len() != expected {
            return Err(EvaluatorError::GatewayShape {
                expected,
                actual: completions.len(),
            });
        }
        Ok(completions)
    }

    fn interrupt(&mut self, mut metrics: RunMetrics) -> RunMetrics {
        self.transition(PipelineState::Interrupted);
        metrics.interrupted = true;
        warn!("Process interrupted by user. Exiting gracefully.");
        info!("{}", metrics.summary());
        self.last_metrics = Some(metrics.clone());
        metrics
    }

    /// Report a fatal error with what the run got through
    fn abort(&mut self, metrics: RunMetrics, err: EvaluatorError) -> EvaluatorError {
        error!("Run aborted: {}", err);
        info!("{}", metrics.summary());
        self.last_metrics = Some(metrics);
        err
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline state: {} -> {}", self.state, next);
        self.state = next;
    }
}
