use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::runtime::Runtime;

use host_snapshot::cli::{Args, Commands};
use host_snapshot::collectors::orchestrator::{local_hostname, Orchestrator};
use host_snapshot::collectors::probes::ProbeContext;
use host_snapshot::config::{load_settings, CollectorSettings};
use host_snapshot::privileges::report_privileges;

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    initialize_logging(args.verbose)?;

    // Handle subcommands
    if let Some(cmd) = &args.command {
        return handle_subcommand(cmd);
    }

    info!("Starting host snapshot collection");

    let settings = load_settings(args.config.as_deref())?;
    report_privileges();

    let hostname = local_hostname();
    let run = args.run_configuration(&hostname, chrono::Utc::now(), &env::temp_dir());
    let ctx = ProbeContext::for_local_host(Arc::new(run), Arc::new(settings));

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    let report = runtime.block_on(Orchestrator::new(ctx).run())?;

    info!("Snapshot written to {}", report.output_root.display());
    if let Some(archive) = &report.archive_path {
        info!("Archive written to {}", archive.display());
    }
    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}

fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            info!("Creating default settings file at {}", path.display());
            CollectorSettings::default().save_to_yaml_file(path)?;
            Ok(())
        }
    }
}
