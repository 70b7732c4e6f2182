//! Command implementations.

pub mod canonical;
pub mod config;
pub mod keygen;
pub mod sign;
pub mod solve;
pub mod verify;

use anyhow::{Context as _, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved config file path
    pub config_path: PathBuf,

    /// Verbosity level from `-v`
    pub verbose: u8,
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Parse a JSON payload file.
pub fn read_payload(path: &Path) -> Result<serde_json::Value> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}
