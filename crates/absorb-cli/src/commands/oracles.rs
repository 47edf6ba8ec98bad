use crate::error::{CliError, Result};
use absorb::core::oracle::registry::{OracleParams, OracleRegistry};
use tracing::info;

pub async fn run() -> Result<()> {
    let registry = OracleRegistry::with_defaults();
    let names = registry.available();
    info!("Listing {} registered oracle(s).", names.len());

    println!("Available energy oracles:");
    for name in names {
        println!("  {}", name);
    }

    let defaults = toml::to_string_pretty(&OracleParams::default())
        .map_err(|e| CliError::Other(e.into()))?;
    println!("\nDefault parameters (override under [oracle] in the config file):");
    println!("{}", defaults);
    Ok(())
}
