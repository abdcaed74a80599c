//! Run command implementation.

use super::parse_target;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::provider::Provider;
use parsewright_agent::Orchestrator;
use parsewright_domain::traits::LlmProvider;
use parsewright_fallback::{AutoReader, LayoutExtractor, LayoutRules};
use parsewright_sandbox::SubprocessSandbox;
use parsewright_store::{ArtifactStore, GroundTruthStore};
use std::sync::Arc;
use tracing::info;

/// Execute the run command.
///
/// Returns whether an artifact was persisted.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<bool> {
    let id = parse_target(&args.target.target)?;

    let mut agent = config.agent_config();
    if let Some(max_attempts) = args.max_attempts {
        agent.max_attempts = max_attempts;
    }

    let ground_truth = GroundTruthStore::new(&config.paths.data_dir);
    let profile = ground_truth.profile(&id)?;

    let provider = Provider::from_settings(&config.llm, agent.request_timeout())?;
    let sandbox = SubprocessSandbox::new(config.sandbox.clone())?;
    let reader = Arc::new(AutoReader::new(&config.reader));
    let fallback = LayoutExtractor::new(LayoutRules::default(), reader.clone())?;

    info!(profile = %id, model = provider.model_name(), "starting");

    let orchestrator = Orchestrator::new(
        provider,
        sandbox,
        fallback,
        ground_truth,
        ArtifactStore::new(&config.paths.artifacts_dir),
        agent,
    )?
    .with_reader(reader);

    // Dropping the run future kills a running candidate; nothing is persisted
    let report = tokio::select! {
        report = orchestrator.run(&profile) => report?,
        _ = tokio::signal::ctrl_c() => return Err(CliError::Interrupted),
    };

    println!("{}", formatter.run_report(&report)?);
    Ok(report.is_success())
}

