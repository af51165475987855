//! Command-line county radius lookup.
//!
//! Loads the county reference files and prints the counties around the ZIP
//! found in an address as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use setaside::config::Config;
use setaside::CountyLocator;

#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "List counties within a radius of the ZIP in an address")]
struct Args {
    /// Free-text address or bare ZIP code
    address: String,

    /// Search radius in miles (defaults to the configured radius)
    #[arg(short, long)]
    radius: Option<f64>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the county reference files (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Only print FIPS codes, one per line
    #[arg(long)]
    fips_only: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setaside::logging::init(args.verbose)?;

    let config = Config::load_or_default(args.config.as_deref())?
        .with_overrides(args.data_dir, args.radius)?;
    let radius = config.search.radius_miles;

    let locator = CountyLocator::new(config.reference.paths());
    let result = locator
        .find_counties_near_address(&args.address, radius)
        .await
        .with_context(|| format!("Lookup failed for '{}'", args.address))?;

    info!(
        "{} ({}, {}): {} counties within {} miles",
        result.center_county.fips,
        result.center_county.name,
        result.center_county.state,
        result.total_found,
        radius
    );

    if args.fips_only {
        for fips in result.fips_codes() {
            println!("{}", fips);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
