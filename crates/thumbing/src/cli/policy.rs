//! The `thumbing policy` command.

use thumbing_core::{AccessPolicy, Config};
use thumbing_core::resize::WORKER_PRINCIPAL;

/// Print the policy the resize worker is granted for the configured bucket.
pub async fn execute(config: Config) -> anyhow::Result<()> {
    let policy = AccessPolicy::read_write(WORKER_PRINCIPAL, &config.bucket.name);
    println!("{}", policy.to_json()?);
    Ok(())
}
