//! `registry canonical` - print the exact bytes a signature covers.

use anyhow::Result;

use registry_srv::identity::canonical_string;

use super::{read_payload, Context};
use crate::cli::args::CanonicalArgs;

pub async fn execute(_ctx: Context, args: CanonicalArgs) -> Result<()> {
    let payload = read_payload(&args.payload)?;
    println!("{}", canonical_string(&payload)?);
    Ok(())
}
