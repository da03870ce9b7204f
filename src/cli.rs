//! Command-line interface for fieldcombat
//!
//! Without `--headless` the binary only validates the configuration files.

use clap::Parser;
use std::path::PathBuf;

/// Real-time combat core runner
#[derive(Parser, Debug)]
#[command(name = "fieldcombat")]
#[command(about = "Real-time combat decision core")]
#[command(version)]
pub struct Args {
    /// Run the JSON scenario headlessly
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub headless: Option<PathBuf>,

    /// Skill database (RON)
    #[arg(long, value_name = "SKILLS_FILE", default_value = "assets/skills.ron")]
    pub skills: PathBuf,

    /// Core settings (RON); defaults are used if the file is missing
    #[arg(long, value_name = "SETTINGS_FILE")]
    pub settings: Option<PathBuf>,

    /// Override the scenario's frame count
    #[arg(long)]
    pub frames: Option<u64>,

    /// Output path for the action log (headless mode only)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Also write the full combat log as JSON (headless mode only)
    #[arg(long, value_name = "LOG_PATH")]
    pub combat_log: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
