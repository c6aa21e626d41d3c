//! CLI argument parsing.

use clap::Parser;
use gridrate_evaluator::ExtractionStrategy;
use std::path::PathBuf;

/// Gridrate - Rate candidate words for crossword grids with an LLM.
#[derive(Debug, Parser)]
#[command(name = "gridrate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Word list, one candidate per line
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Result store (appended to, never rewritten)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Words per inference call
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Model name
    #[arg(short, long, env = "GRIDRATE_MODEL")]
    pub model: Option<String>,

    /// Inference server URL (e.g., http://localhost:11434)
    #[arg(short, long, env = "GRIDRATE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// How the JSON object is located in a completion
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Answer every prompt with this text instead of calling a model
    #[arg(long)]
    pub mock_response: Option<String>,

    /// Log raw model output and state transitions
    #[arg(short, long)]
    pub verbose: bool,
}

/// Extraction strategy argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    /// First `{` to last `}`
    Greedy,
    /// Last balanced object that parses
    LastObject,
}

impl From<StrategyArg> for ExtractionStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Greedy => ExtractionStrategy::Greedy,
            StrategyArg::LastObject => ExtractionStrategy::LastObject,
        }
    }
}
