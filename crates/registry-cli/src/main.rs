//! registry - network registry client and operator tooling.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    registry_cli::run().await
}
