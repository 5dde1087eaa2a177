use anyhow::Result;
use clap::Parser;

use crate::archive::IaClient;
use crate::config::{env_flag, RunOptions};
use crate::runner::{self, RunReport};
use crate::store::S3Store;

/// CLI for emma-ia-transfer: move staged EMMA submissions to the Internet
/// Archive, or manage the per-queue pause sentinels.
#[derive(Parser)]
#[clap(
    name = "emma-ia-transfer",
    version,
    about = "Move EMMA submission packages from S3 staging queues to the Internet Archive"
)]
pub struct Cli {
    /// Positional tokens: a control action (check, clear, pause, resume),
    /// `all`, repository codes (ia, ht, bs) and deployment names
    /// (production, staging), in any order. With no tokens, the default
    /// target repository is processed across all deployments.
    #[clap(value_name = "TOKEN")]
    pub tokens: Vec<String>,
}

/// Resolve options from tokens and environment. Split out of [`run`] so the
/// usage error path needs no collaborators.
pub fn resolve_options(cli: &Cli) -> Result<RunOptions> {
    let mut options = RunOptions::from_tokens(&cli.tokens)?;
    options.dry_run = env_flag("DRY_RUN", false);
    options.debug = env_flag("DEBUG", false);
    Ok(options)
}

/// Extracted async CLI logic entrypoint for integration tests and main().
pub async fn run(cli: Cli) -> Result<RunReport> {
    let options = resolve_options(&cli)?;
    let store = S3Store::from_env().await;
    let archive = IaClient::from_env(options.dry_run);
    let report = runner::run(&options, &store, &archive).await?;
    Ok(report)
}
