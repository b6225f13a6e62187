//! frc-docs CLI: offline FRC documentation bundle and MCP server.
//!
//! Scrapes the WPILib, CTRE Phoenix 6, AdvantageKit, REV Robotics and
//! Limelight documentation into one searchable bundle, then serves it to
//! AI agents over stdio.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
