mod bootstrap_helpers;
mod selection_report;

use anyhow::Result;
use clap::Parser;
use crew_cli::Cli;
use crew_core::SystemClock;
use crew_onboarding::{run_provider_selection, StdioSelectionTerminal};
use crew_provider::{LocalModelDiscovery, TerminalDownloadProgress};

use crate::bootstrap_helpers::init_tracing;
use crate::selection_report::render_selection_report;

fn run_cli(cli: Cli) -> Result<()> {
    let options = cli.catalog_load_options();
    tracing::debug!(
        cache = %options.cache_path.display(),
        url = %options.catalog_url,
        "starting provider selection"
    );
    let mut local_models = LocalModelDiscovery::system(
        cli.ollama_cli.clone(),
        cli.ollama_timeout_ms,
        cli.local_models_ttl(),
    );
    let mut terminal = StdioSelectionTerminal::stdio();
    let mut progress = TerminalDownloadProgress::default();

    let outcome = run_provider_selection(
        &options,
        &SystemClock,
        &mut progress,
        &mut terminal,
        &mut local_models,
    )?;
    println!("{}", render_selection_report(&outcome, cli.output)?);
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    run_cli(Cli::parse())
}
