//! Poolnode CLI Binary
//!
//! Command-line interface for storage node records.

use anyhow::Context;
use clap::Parser;
use poolnode::logging::init_logging;
use poolnode::tooling::cli::{Cli, CliContext};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli.resolve_config().context("loading configuration")?;
    init_logging(Some(&config.logging)).context("initializing logging")?;

    let context = CliContext::new(&config).context("opening node store")?;
    let output = context.execute(&cli.command)?;
    println!("{}", output);
    Ok(())
}
