//! `registry solve` - brute-force a proof-of-work challenge.

use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info};

use registry_srv::challenge::pow::{self, MAX_DIFFICULTY};

use super::Context;
use crate::cli::args::SolveArgs;

pub async fn execute(_ctx: Context, args: SolveArgs) -> Result<()> {
    if args.difficulty > MAX_DIFFICULTY {
        anyhow::bail!("difficulty {} exceeds maximum {MAX_DIFFICULTY}", args.difficulty);
    }

    debug!(puzzle = %args.puzzle, difficulty = args.difficulty, "solving");
    let started = Instant::now();

    let puzzle = args.puzzle.clone();
    let difficulty = args.difficulty;
    let solution = tokio::task::spawn_blocking(move || pow::solve(&puzzle, difficulty)).await?;

    info!(
        elapsed_ms = started.elapsed().as_millis(),
        difficulty,
        "challenge solved"
    );
    println!("{solution}");
    Ok(())
}
