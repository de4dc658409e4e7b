#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case tracker command-line entry point.
//!
//! `case_tracker run <files...>` extracts cases from PDFs and case-list
//! spreadsheets and writes both case tables. Without a subcommand the tool
//! starts an interactive session that re-runs the pipeline after every
//! change.
//!
//! Uses `indicatif-log-bridge` (via [`case_tracker_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod batch;
mod interactive;
mod summary;

use std::path::{Path, PathBuf};

use case_tracker_extract::RuleSet;
use case_tracker_pipeline::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "case_tracker",
    about = "Extract case records from court PDFs and case-list spreadsheets"
)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract cases from the given files and export both case tables
    Run(batch::RunArgs),
    /// Print the built-in rule set as JSON, or validate a rule file
    Rules {
        /// Rule file to validate instead of printing the defaults
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

fn load_settings(path: Option<&Path>) -> Result<Settings, case_tracker_pipeline::PipelineError> {
    path.map_or_else(|| Ok(Settings::default()), Settings::load)
}

fn rules_command(check: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = check else {
        println!("{}", RuleSet::default_rules().to_json_pretty()?);
        return Ok(());
    };

    let (rules, diagnostics) = case_tracker_extract::load_rules(path)?;
    println!(
        "{}: {} rule(s) for {} field(s)",
        path.display(),
        rules.rule_count(),
        rules.field_count()
    );
    for diagnostic in &diagnostics {
        println!("  rejected {diagnostic}");
    }

    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(format!("{} rule(s) rejected", diagnostics.len()).into())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = case_tracker_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => {
            let settings = load_settings(cli.config.as_deref())?;
            batch::run(args, settings, &multi).await?;
        }
        Some(Commands::Rules { check }) => rules_command(check.as_deref())?,
        None => {
            let settings = load_settings(cli.config.as_deref())?;
            interactive::run(settings, &multi).await?;
        }
    }

    Ok(())
}
