//! Gridrate CLI library.
//!
//! This library provides the core functionality for the `gridrate` command-line
//! interface: argument parsing, configuration loading and running the pipeline.

pub mod cli;
pub mod config;
pub mod error;
pub mod run;

pub use cli::{Cli, StrategyArg};
pub use config::{Config, GatewayConfig, Provider};
pub use error::{CliError, Result};
pub use run::{execute, exit_code, run, EXIT_INTERRUPTED};
