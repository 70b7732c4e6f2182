//! `registry verify` - check a payload signature.

use anyhow::Result;
use colored::Colorize;

use registry_srv::identity::{verify, PublicKey};

use super::{read_input, read_payload, Context};
use crate::cli::args::VerifyArgs;

pub async fn execute(_ctx: Context, args: VerifyArgs) -> Result<()> {
    let pem = read_input(&args.public_key)?;
    // Surface key problems as errors instead of a bare "invalid".
    PublicKey::from_pem(&pem)?;
    let payload = read_payload(&args.payload)?;

    if verify(&pem, &payload, &args.signature) {
        println!("{}", "valid".green().bold());
        Ok(())
    } else {
        println!("{}", "invalid".red().bold());
        anyhow::bail!("signature does not verify")
    }
}
