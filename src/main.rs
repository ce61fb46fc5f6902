//! Binary entry point for roleforge.
//!
//! Previews, validates and inspects role clones against a JSON role directory.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stdout in main binary for CLI output
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use roleforge::EngineConfig;
use roleforge::cli::{CloneArgs, cmd_lineage, cmd_preview, cmd_validate};
use roleforge::models::RoleId;
use roleforge::observability::{self, LoggingConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Roleforge - role cloning and lineage engine.
#[derive(Parser)]
#[command(name = "roleforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "ROLEFORGE_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Preview a clone.
    Preview(CloneArgs),

    /// Validate a clone configuration.
    Validate(CloneArgs),

    /// Show the lineage of a role.
    Lineage {
        /// JSON role directory file.
        #[arg(short, long, env = "ROLEFORGE_DIRECTORY")]
        directory: PathBuf,

        /// Role ID.
        role: String,

        /// Tree depth to display.
        #[arg(long)]
        depth: Option<usize>,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_logging(LoggingConfig::from_settings(
        Some(&config.logging),
        cli.verbose,
    )) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(command: Commands, config: &EngineConfig) -> anyhow::Result<()> {
    match command {
        Commands::Preview(args) => {
            let report = cmd_preview(&args, config)
                .await
                .with_context(|| format!("previewing clone of '{}'", args.source))?;
            print_json(&report)
        },
        Commands::Validate(args) => {
            let report = cmd_validate(&args, config)
                .await
                .with_context(|| format!("validating clone of '{}'", args.source))?;
            print_json(&report)
        },
        Commands::Lineage {
            directory,
            role,
            depth,
        } => {
            let report = cmd_lineage(&directory, &RoleId::new(role.trim()), depth, config)
                .await
                .with_context(|| format!("reading lineage of '{role}'"))?;
            print_json(&report)
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing report")?;
    println!("{json}");
    Ok(())
}

/// Loads configuration: explicit path, else the default location, then env overrides.
fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::load_default(),
    };
    Ok(config.apply_env_overrides())
}
