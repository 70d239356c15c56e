// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use stratplan_core::domain::planner_config::PlannerConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./stratplan.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let manifest = PlannerConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. STRATPLAN_CONFIG_PATH: {}",
            std::env::var("STRATPLAN_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./stratplan.yaml");
        println!("  4. ~/.stratplan/config.yaml");
        println!("  5. /etc/stratplan/config.yaml");
        println!();
    }

    let config = &manifest.spec;
    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Competition:".bold());
    println!("  Championship: {}", config.competition.championship_id);
    println!("  Branch: {}", config.competition.branch);
    println!();

    println!("{}", "Wizard:".bold());
    for index in 1..=config.wizard.step_count {
        println!("  {}. {}", index, config.wizard.label(index));
    }
    println!();

    println!("{}", "Storage:".bold());
    println!("  Backend: {:?}", config.storage.backend);
    if let Some(path) = &config.storage.path {
        println!("  Path: {}", path);
    }
    if config.storage.connection_string.is_some() {
        println!("  Connection: {}", "<redacted>".dimmed());
    }
    println!();

    println!("{}", "LLM Providers:".bold());
    if config.llm_providers.is_empty() {
        println!("  {}", "(none, advisor answers with the fallback message)".dimmed());
    }
    for provider in &config.llm_providers {
        let state = if provider.enabled { "" } else { " [disabled]" };
        println!("  {} ({}){}", provider.name.bold(), provider.provider_type, state);
        println!("    Endpoint: {}", provider.endpoint);
        for model in &provider.models {
            println!("      - {} → {}", model.alias, model.model);
        }
    }
    println!();

    println!("{}", "Advisor:".bold());
    println!("  Model alias: {}", config.advisor.model_alias);
    println!("  Retries: {}", config.advisor.max_retries);
    if let Some(fallback) = &config.advisor.fallback_provider {
        println!("  Fallback provider: {}", fallback);
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let manifest = PlannerConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    manifest
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
