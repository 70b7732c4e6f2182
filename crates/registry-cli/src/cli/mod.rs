//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = config::resolve_path(cli.config.as_deref())?;

    let ctx = commands::Context {
        config_path,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Solve(args) => commands::solve::execute(ctx, args).await,
        Commands::Keygen(args) => commands::keygen::execute(ctx, args).await,
        Commands::Canonical(args) => commands::canonical::execute(ctx, args).await,
        Commands::Sign(args) => commands::sign::execute(ctx, args).await,
        Commands::Verify(args) => commands::verify::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
    }
}

// Logs go to stderr so command output stays pipeable. RUST_LOG wins over -v.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
