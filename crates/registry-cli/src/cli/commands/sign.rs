//! `registry sign` - sign a payload with a network private key.

use anyhow::{Context as _, Result};
use tracing::{debug, warn};

use registry_core::ModificationPayload;
use registry_srv::identity::SigningKey;

use super::{read_input, read_payload, Context};
use crate::cli::args::SignArgs;

pub async fn execute(_ctx: Context, args: SignArgs) -> Result<()> {
    let key = SigningKey::from_pem(&read_input(&args.key)?)
        .with_context(|| format!("loading key {}", args.key.display()))?;
    let payload = read_payload(&args.payload)?;

    // Signing works on any JSON, but a malformed modification would be
    // refused by the registry anyway.
    if let Err(e) = serde_json::from_value::<ModificationPayload>(payload.clone()) {
        warn!(error = %e, "payload is not a valid modification payload");
    }

    debug!(algorithm = %key.algorithm(), "signing payload");
    println!("{}", key.sign_payload(&payload)?);
    Ok(())
}
