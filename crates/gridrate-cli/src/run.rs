//! Running the pipeline from resolved configuration.

use crate::cli::Cli;
use crate::config::{Config, Provider};
use crate::error::Result;
use gridrate_domain::InferenceGateway;
use gridrate_evaluator::{CancellationFlag, EvaluatorConfig, PipelineDriver, RunMetrics};
use gridrate_llm::{MockGateway, OllamaGateway};
use std::fmt::Display;
use std::time::Duration;
use tracing::info;

/// Exit code for a run stopped by an interrupt
pub const EXIT_INTERRUPTED: i32 = 130;

/// Load the config file, apply flag overrides and run.
pub async fn run(cli: Cli, cancel: CancellationFlag) -> Result<RunMetrics> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    execute(config, cancel).await
}

/// Build the configured gateway and drive one run to completion.
pub async fn execute(config: Config, cancel: CancellationFlag) -> Result<RunMetrics> {
    config.validate()?;
    let Config { evaluator, gateway } = config;

    match gateway.provider {
        Provider::Ollama => {
            let ollama = OllamaGateway::with_timeout(
                gateway.endpoint.as_str(),
                gateway.model.as_str(),
                Duration::from_secs(gateway.timeout_secs),
            )?
            .with_max_retries(gateway.max_retries);
            info!("Connecting to {} at {}", gateway.model, gateway.endpoint);
            evaluate(ollama, evaluator, cancel).await
        }
        Provider::Mock => {
            let response = gateway.mock_response.unwrap_or_default();
            evaluate(MockGateway::new(response), evaluator, cancel).await
        }
    }
}

async fn evaluate<G>(gateway: G, config: EvaluatorConfig, cancel: CancellationFlag) -> Result<RunMetrics>
where
    G: InferenceGateway + Send + Sync + 'static,
    G::Error: Display,
{
    let mut driver = PipelineDriver::new(gateway, config)?.with_cancellation(cancel);
    Ok(driver.run().await?)
}

/// Process exit code for a run outcome
pub fn exit_code(result: &Result<RunMetrics>) -> i32 {
    match result {
        Ok(metrics) if metrics.interrupted => EXIT_INTERRUPTED,
        Ok(_) => 0,
        Err(_) => 1,
    }
}
