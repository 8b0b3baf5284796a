//! CLI command implementations.

pub mod compile;

use anyhow::{Context, Result};
use stepwright_config::load_manifest;

pub fn validate(path: &str) -> Result<()> {
    let manifest =
        load_manifest(path).with_context(|| format!("Failed to parse step manifest: {}", path))?;
    println!(
        "Manifest is valid: {} service(s), {} step(s)",
        manifest.services.len(),
        manifest.steps.len()
    );
    Ok(())
}
