//! Strength engine command line entry point

use anyhow::Result;
use clap::Parser;
use strength_engine::cli::{Cli, CliHandler};
use strength_engine::initialize_logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration carries the log settings, so it loads before logging starts
    let config = CliHandler::load(&cli.command)?;
    initialize_logging(&config.logging)?;
    info!("Starting strength engine v{}", strength_engine::VERSION);

    let handler = CliHandler::new(config)?;
    let output = handler.execute(cli.command).await?;
    println!("{output}");
    Ok(())
}
