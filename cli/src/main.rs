// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Stratplan CLI
//!
//! The `stratplan` binary edits a team's business plan for a competition
//! round and shows the team's KPI history.
//!
//! ## Commands
//!
//! - `stratplan plan show|set-step|set-canvas|set-empathy|set-epicenter|submit|review|versions`
//! - `stratplan history show|delta` - KPI history per round
//! - `stratplan advise suggest|audit` - AI advisor
//! - `stratplan config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use stratplan_cli::commands::{self, AdviseCommand, ConfigCommand, HistoryCommand, PlanCommand};
use stratplan_cli::embedded::EmbeddedPlanner;
use stratplan_core::domain::planner_config::PlannerConfigManifest;

/// Business plan lifecycle and round KPI history
#[derive(Parser)]
#[command(name = "stratplan")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "STRATPLAN_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "STRATPLAN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text or json)
    #[arg(long, global = true, env = "STRATPLAN_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit and submit a team's plan
    #[command(name = "plan")]
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },

    /// Team KPI history
    #[command(name = "history")]
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// AI advisor
    #[command(name = "advise")]
    Advise {
        #[command(subcommand)]
        command: AdviseCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Config errors are reported by the command; logging falls back to defaults
    let manifest = PlannerConfigManifest::load_or_default(cli.config.clone());
    let logging = manifest
        .as_ref()
        .ok()
        .and_then(|m| m.spec.observability.as_ref())
        .and_then(|o| o.logging.as_ref());
    let level = cli
        .log_level
        .clone()
        .or_else(|| logging.map(|l| l.level.clone()))
        .unwrap_or_else(|| "warn".to_string());
    let format = cli
        .log_format
        .clone()
        .or_else(|| logging.map(|l| l.format.clone()))
        .unwrap_or_else(|| "text".to_string());
    init_logging(&level, &format)?;

    match cli.command {
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        Some(Commands::Plan { command }) => {
            let planner = EmbeddedPlanner::new(manifest?).await?;
            commands::plan::handle_command(command, &planner).await
        }
        Some(Commands::History { command }) => {
            let planner = EmbeddedPlanner::new(manifest?).await?;
            commands::history::handle_command(command, &planner).await
        }
        Some(Commands::Advise { command }) => {
            let planner = EmbeddedPlanner::new(manifest?).await?;
            commands::advise::handle_command(command, &planner).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging. Logs go to stderr so command
/// output stays pipeable.
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
