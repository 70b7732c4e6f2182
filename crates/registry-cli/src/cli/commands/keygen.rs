//! `registry keygen` - generate a network key pair.

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::path::Path;
use tracing::info;

use registry_srv::identity::SigningKey;

use super::Context;
use crate::cli::args::KeygenArgs;

/// Private key file name inside `--out`.
pub const PRIVATE_KEY_FILE: &str = "network.key";

/// Public key file name inside `--out`.
pub const PUBLIC_KEY_FILE: &str = "network.pub";

pub async fn execute(_ctx: Context, args: KeygenArgs) -> Result<()> {
    let key = SigningKey::generate(args.algorithm.into())?;
    let private_pem = key.to_pem();
    let public_pem = key.public_key().to_pem();

    match args.out {
        Some(dir) => write_pair(&dir, &private_pem, &public_pem, args.force)?,
        None => {
            print!("{private_pem}");
            print!("{public_pem}");
        }
    }
    Ok(())
}

fn write_pair(dir: &Path, private_pem: &str, public_pem: &str, force: bool) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let private_path = dir.join(PRIVATE_KEY_FILE);
    let public_path = dir.join(PUBLIC_KEY_FILE);

    if !force {
        for path in [&private_path, &public_path] {
            if path.exists() {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
        }
    }

    std::fs::write(&private_path, private_pem)
        .with_context(|| format!("writing {}", private_path.display()))?;
    std::fs::write(&public_path, public_pem)
        .with_context(|| format!("writing {}", public_path.display()))?;

    info!(dir = %dir.display(), "wrote key pair");
    println!(
        "{} {}\n{} {}",
        "Private key:".bold(),
        private_path.display(),
        "Public key: ".bold(),
        public_path.display()
    );
    Ok(())
}
