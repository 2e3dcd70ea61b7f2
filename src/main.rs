use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cpglob::args::Cli;
use cpglob::{CliProgress, CopyEngine};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let request = cli.into_request();
    let progress = Arc::new(CliProgress::new(request.options.show_progress));
    let engine = CopyEngine::new(request, progress);

    // Copies cannot be cancelled mid-run; interrupting leaves finished files behind.
    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted, files already copied are left in place.");
        std::process::exit(130);
    })
    .context("failed to install Ctrl-C handler")?;

    engine.run()?;
    Ok(())
}
