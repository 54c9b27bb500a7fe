//! CLI argument parsing for usermigrate

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "um")]
#[command(author, version, about = "Migrate user records and classify their roles", long_about = None)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}
