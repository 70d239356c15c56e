// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AI advisor commands
//!
//! Commands: suggest, audit

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use stratplan_core::application::Advice;
use stratplan_core::domain::plan::PlanStatus;

use super::plan::PlanTarget;
use crate::embedded::EmbeddedPlanner;

#[derive(Subcommand)]
pub enum AdviseCommand {
    /// Ask the advisor to propose content for a plan field
    Suggest {
        #[command(flatten)]
        target: PlanTarget,

        /// Wizard step the suggestion is for
        #[arg(long)]
        step: u8,

        /// Block or field the suggestion is for (e.g. value_propositions)
        #[arg(long)]
        field: String,

        /// Extra instructions for the advisor
        #[arg(long, default_value = "")]
        prompt: String,

        /// Write the suggestion into the step and save a draft
        #[arg(long)]
        apply: bool,
    },

    /// Ask the advisor to critique the plan against the KPI history
    Audit {
        #[command(flatten)]
        target: PlanTarget,

        /// Wizard step the audit is for (default: last step)
        #[arg(long)]
        step: Option<u8>,
    },
}

pub async fn handle_command(command: AdviseCommand, planner: &EmbeddedPlanner) -> Result<()> {
    match command {
        AdviseCommand::Suggest {
            target,
            step,
            field,
            prompt,
            apply,
        } => {
            let team_id = target.team_id();
            let doc = planner.lifecycle.load_or_init(&team_id, target.round).await?;
            let advice = planner.advisory.suggest(&doc, step, &field, &prompt).await;
            print_advice(&advice);

            if apply && !advice.is_fallback {
                let updated = planner.lifecycle.update_step(&doc, step, &advice.text)?;
                let persisted = planner
                    .lifecycle
                    .save(&updated, PlanStatus::Draft)
                    .await
                    .context("Failed to save suggestion")?;
                println!(
                    "{}",
                    format!("✓ Applied to step {} (version {})", step, persisted.version()).green()
                );
            }
            Ok(())
        }
        AdviseCommand::Audit { target, step } => {
            let team_id = target.team_id();
            let doc = planner.lifecycle.load_or_init(&team_id, target.round).await?;
            let history = planner.history.team_history(&team_id).await?;
            let step = step.unwrap_or_else(|| planner.lifecycle.step_count());
            let advice = planner.advisory.audit(&doc, step, &history).await;
            print_advice(&advice);
            Ok(())
        }
    }
}

fn print_advice(advice: &Advice) {
    if advice.is_fallback {
        println!("{}", advice.text.yellow());
    } else {
        println!("{}", advice.text);
    }
}
