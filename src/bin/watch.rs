//! Watch source_folder for changes; refresh the project and report problems.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use traceables::watch::run_watcher;
use traceables::{Config, Project};

#[derive(Parser, Debug)]
#[command(name = "watch")]
#[command(about = "Watch source_folder and keep traceables up to date")]
struct Args {
    /// Configuration file (defaults to $TRACEABLES_CONFIG, then ./traceables.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debounce delay in milliseconds (defaults to [watch] debounce_ms)
    #[arg(long)]
    debounce_ms: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load_with_override(args.config.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.traceables.log_level.as_str()),
    )
    .init();

    let debounce_ms = args.debounce_ms.unwrap_or(config.watch.debounce_ms);
    log::info!("Starting traceables watcher");
    log::info!("Docs root: {}", config.source_folder().display());
    log::info!("Debounce: {} ms", debounce_ms);

    let mut session = config.build_session()?;
    let root = config.source_folder().canonicalize()?;
    let (mut project, summary) = Project::load(root, &mut session)?;
    log::info!(
        "Loaded {} documents, {} traceables, {} problem(s)",
        summary.added,
        session.registry().len(),
        session.diagnostics().len()
    );

    log::info!("Watching for changes (Ctrl+C to stop)");
    run_watcher(&mut project, &mut session, Duration::from_millis(debounce_ms))?;
    Ok(())
}
