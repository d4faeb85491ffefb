//! CLI entry point for patchget.

use anyhow::{Context, Result};
use clap::Parser;
use patchget::catalog::CatalogStore;
use patchget::extract::PortalPageContract;
use patchget::options::RunOptions;
use patchget::orchestrator::{RunContext, run};
use patchget::prompt::{Console, TerminalConsole};
use patchget::transport::{PortalClient, PromptingCredentials};
use tracing::{debug, info};

mod cli;

use cli::Args;

const USAGE: &str = "USAGE: patchget patch=<patch_number_1>[,<patch_number_n>]* [platform=<plcode_1>[,<plcode_n>]*] [reset=yes] [regexp=<regular_expression>] [download=all] [stagedir=<directory>] [MOSUser=<username>] [MOSPass=<password>] [silent=yes] [debug=yes]";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let mut console = TerminalConsole::new();
    if args.params.is_empty() {
        console.say("");
        console.say("ERROR: At least one parameter needs to be specified!");
        console.say(USAGE);
        return Ok(());
    }

    let options = RunOptions::from_params(&args.params);
    debug!(?options, "run options resolved");

    let credentials = PromptingCredentials::new(options.username.clone(), options.password.clone());
    let portal = PortalClient::new(args.portal_url.as_str(), Box::new(credentials))
        .context("failed to create portal client")?;
    let contract = PortalPageContract::new();
    let store = CatalogStore::new(&args.catalog_file);
    let context = RunContext {
        portal: &portal,
        contract: &contract,
        store: &store,
    };

    let summary = run(&options, &context, &mut console)
        .await
        .context("patchget run failed")?;

    info!(
        files = summary.files,
        bytes = summary.bytes,
        "patchget finished"
    );
    Ok(())
}
