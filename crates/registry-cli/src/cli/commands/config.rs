//! `registry config` - show the effective configuration.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::ConfigArgs;
use crate::config;

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    if args.show_path {
        println!("{}", ctx.config_path.display());
        return Ok(());
    }

    let effective = config::load(&ctx.config_path)?;
    if ctx.verbose > 0 {
        let source = if ctx.config_path.exists() {
            ctx.config_path.display().to_string()
        } else {
            format!("{} (not found, using defaults)", ctx.config_path.display())
        };
        eprintln!("{} {}", "Config:".bold(), source);
    }
    println!("{}", toml::to_string_pretty(&effective)?);
    println!(
        "# effective difficulty: {}",
        effective.challenge.effective_difficulty()
    );
    Ok(())
}
