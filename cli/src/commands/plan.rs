// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Plan editing commands
//!
//! Commands: show, set-step, set-canvas, set-empathy, set-epicenter, submit,
//! review, versions

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;

use stratplan_core::domain::plan::{
    CanvasBlock, EmpathyBlock, PersistedPlanDocument, PlanDocument, PlanStatus, Round, TeamId,
};

use crate::embedded::EmbeddedPlanner;

/// Which (team, round) lineage a command works on.
#[derive(Args, Debug, Clone)]
pub struct PlanTarget {
    /// Team identifier
    #[arg(long, env = "STRATPLAN_TEAM")]
    pub team: String,

    /// Competition round (1-based)
    #[arg(long, short)]
    pub round: Round,
}

impl PlanTarget {
    pub fn team_id(&self) -> TeamId {
        TeamId::new(self.team.clone())
    }
}

#[derive(Subcommand)]
pub enum PlanCommand {
    /// Show the active version of a plan
    Show {
        #[command(flatten)]
        target: PlanTarget,

        /// Print the document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the text of a wizard step and save a draft
    SetStep {
        #[command(flatten)]
        target: PlanTarget,

        #[arg(value_name = "INDEX")]
        index: u8,

        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Set a Business Model Canvas block and save a draft
    SetCanvas {
        #[command(flatten)]
        target: PlanTarget,

        /// Block name (e.g. value_propositions)
        #[arg(value_name = "BLOCK")]
        block: String,

        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Set an Empathy Map block and save a draft
    SetEmpathy {
        #[command(flatten)]
        target: PlanTarget,

        /// Block name (e.g. pains)
        #[arg(value_name = "BLOCK")]
        block: String,

        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Declare the plan's epicenter and save a draft
    SetEpicenter {
        #[command(flatten)]
        target: PlanTarget,

        /// resource, offer, customer or finance
        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Submit the plan; the team can no longer edit it
    Submit {
        #[command(flatten)]
        target: PlanTarget,
    },

    /// Record a reviewer decision on a submitted plan
    Review {
        #[command(flatten)]
        target: PlanTarget,

        #[arg(long, value_enum)]
        status: ReviewStatus,
    },

    /// List every saved version of a plan
    Versions {
        #[command(flatten)]
        target: PlanTarget,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReviewStatus {
    Approved,
    Finalized,
}

impl From<ReviewStatus> for PlanStatus {
    fn from(status: ReviewStatus) -> Self {
        match status {
            ReviewStatus::Approved => PlanStatus::Approved,
            ReviewStatus::Finalized => PlanStatus::Finalized,
        }
    }
}

pub async fn handle_command(command: PlanCommand, planner: &EmbeddedPlanner) -> Result<()> {
    let lifecycle = &planner.lifecycle;

    match command {
        PlanCommand::Show { target, json } => {
            let doc = lifecycle.load_or_init(&target.team_id(), target.round).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                print_plan(&doc, planner);
            }
            Ok(())
        }
        PlanCommand::SetStep { target, index, text } => {
            let doc = lifecycle.load_or_init(&target.team_id(), target.round).await?;
            let doc = lifecycle.update_step(&doc, index, &text)?;
            save_draft(planner, &doc).await
        }
        PlanCommand::SetCanvas { target, block, text } => {
            let doc = lifecycle.load_or_init(&target.team_id(), target.round).await?;
            let doc = lifecycle.update_canvas_block(&doc, &block, &text)?;
            save_draft(planner, &doc).await
        }
        PlanCommand::SetEmpathy { target, block, text } => {
            let doc = lifecycle.load_or_init(&target.team_id(), target.round).await?;
            let doc = lifecycle.update_empathy_block(&doc, &block, &text)?;
            save_draft(planner, &doc).await
        }
        PlanCommand::SetEpicenter { target, value } => {
            let doc = lifecycle.load_or_init(&target.team_id(), target.round).await?;
            let doc = lifecycle.set_epicenter(&doc, &value)?;
            save_draft(planner, &doc).await
        }
        PlanCommand::Submit { target } => {
            let doc = lifecycle.load_or_init(&target.team_id(), target.round).await?;
            let persisted = lifecycle.submit(&doc).await.context("Submission failed")?;
            print_saved(&persisted);
            Ok(())
        }
        PlanCommand::Review { target, status } => {
            let doc = lifecycle.load_or_init(&target.team_id(), target.round).await?;
            let persisted = lifecycle
                .save(&doc, status.into())
                .await
                .context("Review failed")?;
            print_saved(&persisted);
            Ok(())
        }
        PlanCommand::Versions { target } => {
            let lineage = lifecycle.lineage(&target.team_id(), target.round).await?;
            if lineage.is_empty() {
                println!("{}", "No saved versions".dimmed());
                return Ok(());
            }
            println!("{:<8} {:<10} {}", "VERSION".bold(), "STATUS".bold(), "SAVED AT".bold());
            for doc in &lineage {
                let saved_at = doc
                    .saved_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<8} {:<10} {}", doc.version, status_label(doc.status), saved_at);
            }
            Ok(())
        }
    }
}

async fn save_draft(planner: &EmbeddedPlanner, doc: &PlanDocument) -> Result<()> {
    let persisted = planner
        .lifecycle
        .save(doc, PlanStatus::Draft)
        .await
        .context("Failed to save draft")?;
    print_saved(&persisted);
    Ok(())
}

fn print_saved(persisted: &PersistedPlanDocument) {
    println!(
        "{}",
        format!(
            "✓ Saved {} round {} version {} ({})",
            persisted.team_id,
            persisted.round,
            persisted.version(),
            persisted.status()
        )
        .green()
    );
}

fn status_label(status: PlanStatus) -> String {
    match status {
        PlanStatus::Draft => status.as_str().yellow().to_string(),
        PlanStatus::Submitted => status.as_str().cyan().to_string(),
        PlanStatus::Approved | PlanStatus::Finalized => status.as_str().green().to_string(),
    }
}

fn print_plan(doc: &PlanDocument, planner: &EmbeddedPlanner) {
    let version = if doc.is_persisted() {
        format!("version {} ({})", doc.version, status_label(doc.status))
    } else {
        "not saved yet".dimmed().to_string()
    };
    println!("{} round {}: {}", doc.team_id.as_str().bold(), doc.round, version);
    println!();

    let wizard = &planner.config.wizard;
    println!("{}", "Steps:".bold());
    for index in 1..=wizard.step_count {
        let text = doc.step_text(index).unwrap_or("");
        println!("  {}. {}: {}", index, wizard.label(index), placeholder(text));
    }
    println!();

    println!("{}", "Business Model Canvas:".bold());
    for block in CanvasBlock::ALL {
        println!("  {}: {}", block.as_str(), placeholder(doc.data.canvas.get(block)));
    }
    println!();

    println!("{}", "Empathy Map:".bold());
    for block in EmpathyBlock::ALL {
        println!("  {}: {}", block.as_str(), placeholder(doc.data.empathy.get(block)));
    }
    println!();

    println!("{} {}", "Epicenter:".bold(), doc.data.epicenter);
}

fn placeholder(text: &str) -> String {
    if text.is_empty() {
        "—".dimmed().to_string()
    } else {
        text.to_string()
    }
}
