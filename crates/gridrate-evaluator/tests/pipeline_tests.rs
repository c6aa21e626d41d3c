//! End-to-end tests for the evaluation pipeline
//!
//! These tests drive the full load → filter → infer → extract → persist
//! cycle against temporary files and stub gateways.

use gridrate_domain::{DecodingConfig, EvaluationSchema, InferenceGateway};
use gridrate_evaluator::{
    load_processed, CancellationFlag, EvaluatorConfig, EvaluatorError, ExtractionStrategy,
    PipelineDriver, PipelineState, PromptBuilder,
};
use gridrate_llm::MockGateway;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn config_in(dir: &TempDir, words: &[&str]) -> EvaluatorConfig {
    let input_path = dir.path().join("wordlist.txt");
    std::fs::write(&input_path, words.join("\n")).unwrap();
    EvaluatorConfig {
        input_path,
        output_path: dir.path().join("results.csv"),
        sync_writes: false,
        ..Default::default()
    }
}

fn prompt_for(word: &str) -> String {
    let schema = EvaluationSchema::word_evaluation();
    PromptBuilder::new(&schema).build(word)
}

fn answer(word: &str, rating: i64) -> String {
    format!(
        "Thinking about '{}' as a crossword entry.\n{{\"word\": \"{}\", \"analysis\": \"ok\", \"rating\": {}}}",
        word, word, rating
    )
}

fn store_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Word named in a prompt built by `PromptBuilder`
fn word_in(prompt: &str) -> String {
    prompt.rsplit('\'').nth(1).unwrap_or_default().to_string()
}

/// Gateway that rates every word with a fixed function and records what it saw
#[derive(Clone)]
struct RatingGateway {
    rate: fn(&str) -> Option<i64>,
    seen: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    cancel_after: Option<(usize, CancellationFlag)>,
}

impl RatingGateway {
    fn new(rate: fn(&str) -> Option<i64>) -> Self {
        Self {
            rate,
            seen: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            cancel_after: None,
        }
    }

    fn cancel_after(mut self, calls: usize, flag: CancellationFlag) -> Self {
        self.cancel_after = Some((calls, flag));
        self
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl InferenceGateway for RatingGateway {
    type Error = String;

    fn generate_batch(&self, prompts: &[String], _decoding: &DecodingConfig) -> Result<Vec<String>, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let out = prompts
            .iter()
            .map(|p| {
                let word = word_in(p);
                self.seen.lock().unwrap().push(word.clone());
                match (self.rate)(&word) {
                    Some(rating) => answer(&word, rating),
                    None => "I cannot decide.".to_string(),
                }
            })
            .collect();
        if let Some((after, flag)) = &self.cancel_after {
            if call >= *after {
                flag.cancel();
            }
        }
        Ok(out)
    }
}

/// Gateway that drops the last completion of every batch
struct ShortGateway;

impl InferenceGateway for ShortGateway {
    type Error = String;

    fn generate_batch(&self, prompts: &[String], _decoding: &DecodingConfig) -> Result<Vec<String>, String> {
        Ok(prompts.iter().skip(1).map(|p| answer(&word_in(p), 30)).collect())
    }
}

fn rate_by_length(word: &str) -> Option<i64> {
    Some(10 + (word.len() as i64 * 7) % 41)
}

#[tokio::test]
async fn test_full_run_persists_every_word() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, &["apple", "zebra", "kiwi"]);
    let output = config.output_path.clone();

    let mut gateway = MockGateway::default();
    gateway.add_response(prompt_for("apple"), answer("apple", 42));
    gateway.add_response(prompt_for("zebra"), answer("zebra", 35));
    gateway.add_response(prompt_for("kiwi"), answer("kiwi", 28));

    let mut driver = PipelineDriver::new(gateway.clone(), config).unwrap();
    let metrics = driver.run().await.unwrap();

    assert_eq!(store_lines(&output), vec!["apple;42", "zebra;35", "kiwi;28"]);
    assert_eq!(metrics.persisted, 3);
    assert_eq!(metrics.skipped, 0);
    assert_eq!(metrics.completed(), 3);
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(driver.state(), PipelineState::Done);
}

#[tokio::test]
async fn test_resume_only_attempts_unprocessed_words() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, &["apple", "zebra"]);
    std::fs::write(&config.output_path, "apple;42\n").unwrap();
    let output = config.output_path.clone();

    let gateway = RatingGateway::new(rate_by_length);
    let mut driver = PipelineDriver::new(gateway.clone(), config).unwrap();
    let metrics = driver.run().await.unwrap();

    assert_eq!(gateway.seen(), vec!["zebra"]);
    assert_eq!(metrics.already_processed, 1);
    assert_eq!(metrics.persisted, 1);
    assert_eq!(store_lines(&output), vec!["apple;42".to_string(), format!("zebra;{}", rate_by_length("zebra").unwrap())]);
}

#[tokio::test]
async fn test_second_run_appends_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, &["alpha", "beta", "gamma", "delta"]);
    let output = config.output_path.clone();

    let mut first = PipelineDriver::new(RatingGateway::new(rate_by_length), config.clone()).unwrap();
    first.run().await.unwrap();
    let after_first = store_lines(&output);

    let gateway = RatingGateway::new(rate_by_length);
    let mut second = PipelineDriver::new(gateway.clone(), config).unwrap();
    let metrics = second.run().await.unwrap();

    assert_eq!(store_lines(&output), after_first);
    assert_eq!(after_first.len(), 4);
    assert_eq!(metrics.backlog, 0);
    assert_eq!(metrics.persisted, 0);
    assert!(gateway.seen().is_empty());
}

#[tokio::test]
async fn test_malformed_outputs_are_skipped_and_retried_next_run() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, &["good", "prose", "broken", "high", "renamed"]);
    let output = config.output_path.clone();

    let mut gateway = MockGateway::default();
    gateway.add_response(prompt_for("good"), answer("good", 40));
    gateway.add_response(prompt_for("prose"), "No JSON here, just words.");
    gateway.add_response(prompt_for("broken"), r#"{"word": "broken", "rating": }"#);
    gateway.add_response(prompt_for("high"), answer("high", 99));
    gateway.add_response(prompt_for("renamed"), answer("other", 20));

    let mut driver = PipelineDriver::new(gateway, config.clone()).unwrap();
    let metrics = driver.run().await.unwrap();

    assert_eq!(store_lines(&output), vec!["good;40"]);
    assert_eq!(metrics.attempted, 5);
    assert_eq!(metrics.persisted, 1);
    assert_eq!(metrics.skipped, 4);

    // Skipped words are indistinguishable from never attempted
    let retry = RatingGateway::new(|_| Some(25));
    let mut driver = PipelineDriver::new(retry.clone(), config).unwrap();
    driver.run().await.unwrap();
    assert_eq!(retry.seen(), vec!["prose", "broken", "high", "renamed"]);
    assert_eq!(store_lines(&output).len(), 5);
}

#[tokio::test]
async fn test_out_of_range_ratings_never_reach_store() {
    let dir = TempDir::new().unwrap();
    let words: Vec<String> = (0..60).map(|i| format!("w{}", i)).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let config = config_in(&dir, &refs);
    let output = config.output_path.clone();

    // Ratings spread from 0 to 59
    let gateway = RatingGateway::new(|w| w[1..].parse().ok());
    let mut driver = PipelineDriver::new(gateway, config).unwrap();
    let metrics = driver.run().await.unwrap();

    let lines = store_lines(&output);
    assert_eq!(lines.len(), 41);
    assert_eq!(metrics.skipped, 19);
    for line in lines {
        let (_, rating) = line.split_once(';').unwrap();
        let rating: i64 = rating.parse().unwrap();
        assert!((10..=50).contains(&rating));
    }
}

#[tokio::test]
async fn test_batch_size_does_not_change_results() {
    let words = ["one", "two", "three", "four", "five", "six", "seven", "eight", "nine"];
    let rate: fn(&str) -> Option<i64> = |w| if w.contains('e') { Some(10 + w.len() as i64) } else { None };

    let mut results = Vec::new();
    for batch_size in [1, 2, 4, 32] {
        let dir = TempDir::new().unwrap();
        let config = EvaluatorConfig {
            batch_size,
            ..config_in(&dir, &words)
        };
        let output = config.output_path.clone();
        let gateway = RatingGateway::new(rate);
        let mut driver = PipelineDriver::new(gateway.clone(), config).unwrap();
        let metrics = driver.run().await.unwrap();

        assert_eq!(metrics.batches, words.len().div_ceil(batch_size));
        let mut lines = store_lines(&output);
        lines.sort();
        results.push(lines);
    }

    for lines in &results[1..] {
        assert_eq!(lines, &results[0]);
    }
}

#[tokio::test]
async fn test_batches_respect_batch_size() {
    let dir = TempDir::new().unwrap();
    let words: Vec<String> = (0..70).map(|i| format!("word{}", i)).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let config = config_in(&dir, &refs);

    let gateway = MockGateway::new("nothing useful");
    let mut driver = PipelineDriver::new(gateway.clone(), config).unwrap();
    let metrics = driver.run().await.unwrap();

    assert_eq!(gateway.batch_sizes(), vec![32, 32, 6]);
    assert_eq!(metrics.skipped, 70);
    let decoding = gateway.last_decoding().unwrap();
    assert!(decoding.guided_schema.is_some());
    assert_eq!(decoding.max_tokens, 1024);
}

#[tokio::test]
async fn test_duplicate_input_words_persist_once() {
    let dir = TempDir::new().unwrap();
    let config = EvaluatorConfig {
        batch_size: 2,
        ..config_in(&dir, &["echo", "echo", "fox", "echo"])
    };
    let output = config.output_path.clone();

    let gateway = RatingGateway::new(|_| Some(33));
    let mut driver = PipelineDriver::new(gateway, config).unwrap();
    let metrics = driver.run().await.unwrap();

    assert_eq!(store_lines(&output), vec!["echo;33", "fox;33"]);
    assert_eq!(metrics.duplicates, 2);
    assert_eq!(metrics.completed(), 4);
    assert_eq!(metrics.progress(), 100.0);
    let processed = load_processed(&output).unwrap();
    assert_eq!(processed.len(), 2);
}

#[tokio::test]
async fn test_interruption_leaves_complete_lines_and_resumes() {
    let dir = TempDir::new().unwrap();
    let words: Vec<String> = (0..10).map(|i| format!("item{}", i)).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let config = EvaluatorConfig {
        batch_size: 3,
        ..config_in(&dir, &refs)
    };
    let output = config.output_path.clone();

    // Cancel as soon as the first batch has been generated
    let flag = CancellationFlag::new();
    let gateway = RatingGateway::new(|_| Some(20)).cancel_after(1, flag.clone());
    let mut driver = PipelineDriver::new(gateway.clone(), config.clone())
        .unwrap()
        .with_cancellation(flag);
    let metrics = driver.run().await.unwrap();

    assert!(metrics.interrupted);
    assert_eq!(driver.state(), PipelineState::Interrupted);
    let contents = std::fs::read_to_string(&output).unwrap_or_default();
    assert!(contents.is_empty() || contents.ends_with('\n'));
    for line in contents.lines() {
        let (word, rating) = line.split_once(';').unwrap();
        assert!(word.starts_with("item"));
        assert_eq!(rating, "20");
    }

    // The next run finishes the rest without duplicating anything
    let mut resumed = PipelineDriver::new(RatingGateway::new(|_| Some(20)), config).unwrap();
    let metrics = resumed.run().await.unwrap();
    assert!(!metrics.interrupted);

    let mut lines = store_lines(&output);
    assert_eq!(lines.len(), 10);
    lines.sort();
    lines.dedup();
    assert_eq!(lines.len(), 10);
}

#[tokio::test]
async fn test_interruption_between_batches_keeps_earlier_batches() {
    let dir = TempDir::new().unwrap();
    let config = EvaluatorConfig {
        batch_size: 2,
        ..config_in(&dir, &["a1", "a2", "b1", "b2", "c1"])
    };
    let output = config.output_path.clone();

    // Cancelled during the second call: its completions are discarded
    let flag = CancellationFlag::new();
    let gateway = RatingGateway::new(|_| Some(44)).cancel_after(2, flag.clone());
    let mut driver = PipelineDriver::new(gateway.clone(), config)
        .unwrap()
        .with_cancellation(flag);
    let metrics = driver.run().await.unwrap();

    assert!(metrics.interrupted);
    assert_eq!(store_lines(&output), vec!["a1;44", "a2;44"]);
    assert_eq!(gateway.seen().len(), 4);
}

#[tokio::test]
async fn test_gateway_failure_is_fatal_but_keeps_durable_writes() {
    let dir = TempDir::new().unwrap();
    let config = EvaluatorConfig {
        batch_size: 1,
        ..config_in(&dir, &["first", "second", "third"])
    };
    let output = config.output_path.clone();

    let mut gateway = MockGateway::default();
    gateway.add_response(prompt_for("first"), answer("first", 30));
    gateway.add_error(prompt_for("second"));

    let mut driver = PipelineDriver::new(gateway.clone(), config).unwrap();
    let result = driver.run().await;

    assert!(matches!(result, Err(EvaluatorError::Gateway(_))));
    assert_eq!(store_lines(&output), vec!["first;30"]);
    assert_eq!(gateway.call_count(), 2);

    let metrics = driver.last_metrics().unwrap();
    assert_eq!(metrics.attempted, 1);
    assert_eq!(metrics.persisted, 1);
    assert_eq!(metrics.batches, 1);
    assert!(!metrics.interrupted);
}

#[tokio::test]
async fn test_gateway_shape_mismatch_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, &["x1", "x2", "x3"]);
    let output = config.output_path.clone();

    let mut driver = PipelineDriver::new(ShortGateway, config).unwrap();
    let result = driver.run().await;

    match result {
        Err(EvaluatorError::GatewayShape { expected, actual }) => {
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("Expected shape error, got {:?}", other.map(|m| m.persisted)),
    }
    assert!(store_lines(&output).is_empty());
}

#[tokio::test]
async fn test_last_object_strategy_recovers_echoed_examples() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir, &["cat"]);
    let output = config.output_path.clone();
    let raw = concat!(
        "Compare with {\"word\": \"apple\", \"analysis\": \"x\", \"rating\": 50}.\n",
        "{\"word\": \"cat\", \"analysis\": \"common word\", \"rating\": 45}"
    );

    let mut gateway = MockGateway::default();
    gateway.add_response(prompt_for("cat"), raw);

    let mut greedy = PipelineDriver::new(gateway.clone(), config.clone()).unwrap();
    assert_eq!(greedy.run().await.unwrap().persisted, 0);

    config.extraction_strategy = ExtractionStrategy::LastObject;
    let mut last = PipelineDriver::new(gateway, config).unwrap();
    assert_eq!(last.run().await.unwrap().persisted, 1);
    assert_eq!(store_lines(&output), vec!["cat;45"]);
}

#[tokio::test]
async fn test_store_failure_aborts_run() {
    let dir = TempDir::new().unwrap();
    let config = EvaluatorConfig {
        output_path: dir.path().join("missing-dir").join("results.csv"),
        ..config_in(&dir, &["word"])
    };

    let mut driver = PipelineDriver::new(RatingGateway::new(|_| Some(30)), config).unwrap();
    let result = driver.run().await;
    assert!(matches!(result, Err(EvaluatorError::Store(_))));

    let metrics = driver.last_metrics().unwrap();
    assert_eq!(metrics.persisted, 0);
    assert_eq!(metrics.batches, 1);
}

#[tokio::test]
async fn test_resume_after_torn_trailing_line() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, &["kiwi", "apple"]);
    std::fs::write(&config.output_path, "kiwi;42\nche").unwrap();
    let output = config.output_path.clone();

    let gateway = RatingGateway::new(|_| Some(30));
    let mut driver = PipelineDriver::new(gateway.clone(), config.clone()).unwrap();
    let metrics = driver.run().await.unwrap();

    assert_eq!(gateway.seen(), vec!["apple"]);
    assert_eq!(metrics.persisted, 1);
    let contents = std::fs::read_to_string(&output).unwrap();
    assert!(contents.ends_with("\napple;30\n"));

    let processed = load_processed(&output).unwrap();
    assert!(processed.contains("apple"));
    assert!(processed.contains("kiwi"));
    assert_eq!(processed.len(), 2);

    // apple is rated exactly once
    let again = RatingGateway::new(|_| Some(30));
    let mut driver = PipelineDriver::new(again.clone(), config).unwrap();
    let metrics = driver.run().await.unwrap();
    assert_eq!(metrics.backlog, 0);
    assert_eq!(metrics.persisted, 0);
    assert!(again.seen().is_empty());
}
