//! UserMigrate - CLI entry point

use std::io::IsTerminal;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::info;

use usermigrate::cli::Cli;
use usermigrate::{Migrator, MysqlConnector};

fn setup_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("Failed to build log filter")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(filter)
        .init();
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging() {
        eprintln!("{} {:#}", "✗".red(), e);
        std::process::exit(1);
    }

    info!(config = %cli.config.display(), "usermigrate starting");

    let mut migrator = Migrator::new(&cli.config, MysqlConnector);
    match migrator.run() {
        Ok(report) => {
            println!(
                "{} Migrated {} rows into '{}'",
                "✓".green(),
                report.rows_written,
                report.table.cyan()
            );
            for (role, count) in &report.roles {
                println!("  {}: {}", role, count);
            }
        }
        Err(e) => {
            eprintln!(
                "{} Migration failed after stage '{}': {}",
                "✗".red(),
                migrator.stage(),
                e
            );
            std::process::exit(1);
        }
    }
}
