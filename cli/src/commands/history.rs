// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! KPI history commands
//!
//! Commands: show, delta

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use stratplan_core::domain::kpi::{indicator_catalogue, HistoryTable};
use stratplan_core::domain::plan::{Round, TeamId};

use crate::embedded::EmbeddedPlanner;

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// Show the team's indicators for every recorded round
    Show {
        /// Team identifier
        #[arg(long, env = "STRATPLAN_TEAM")]
        team: String,

        /// Only these indicators (default: the whole catalogue)
        #[arg(long = "indicator", short = 'i', value_name = "NAME")]
        indicators: Vec<String>,

        /// Print the history as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how an indicator changed against the previous recorded round
    Delta {
        /// Team identifier
        #[arg(long, env = "STRATPLAN_TEAM")]
        team: String,

        #[arg(long = "indicator", short = 'i', value_name = "NAME")]
        indicator: String,

        /// Round to compare (default: latest recorded)
        #[arg(long, short)]
        round: Option<Round>,
    },
}

pub async fn handle_command(command: HistoryCommand, planner: &EmbeddedPlanner) -> Result<()> {
    match command {
        HistoryCommand::Show { team, indicators, json } => {
            let table = planner.history.team_history(&TeamId::new(team)).await?;
            if json {
                let value = stratplan_core::application::advisory::history_json(&table);
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }
            let names: Vec<String> = if indicators.is_empty() {
                indicator_catalogue().iter().map(|i| i.name.to_string()).collect()
            } else {
                indicators
            };
            print_table(&table, &names)
        }
        HistoryCommand::Delta { team, indicator, round } => {
            let table = planner.history.team_history(&TeamId::new(team)).await?;
            let round = match round.or_else(|| table.latest_round()) {
                Some(round) => round,
                None => {
                    println!("{}", "No KPI history recorded yet".dimmed());
                    return Ok(());
                }
            };

            let current = table.value_at(round, &indicator)?;
            let delta = table
                .delta(round, &indicator)
                .with_context(|| format!("Cannot compute delta for '{}'", indicator))?;

            println!("{} round {}: {}", indicator.bold(), round, format_value(current));
            match delta {
                Some(d) if d > 0.0 => println!("  change: {}", format!("+{:.2}", d).green()),
                Some(d) if d < 0.0 => println!("  change: {}", format!("{:.2}", d).red()),
                Some(_) => println!("  change: 0.00"),
                None => println!("  change: {}", "n/a".dimmed()),
            }
            Ok(())
        }
    }
}

fn print_table(table: &HistoryTable, names: &[String]) -> Result<()> {
    if table.is_empty() {
        println!("{}", "No KPI history recorded yet".dimmed());
        return Ok(());
    }

    let rounds = table.rounds();
    let mut header = format!("{:<20}", "INDICATOR");
    for round in &rounds {
        header.push_str(&format!(" {:>14}", format!("R{}", round)));
    }
    println!("{}", header.bold());

    for name in names {
        let mut line = format!("{:<20}", name);
        for (_, value) in table.series(name)? {
            line.push_str(&format!(" {:>14}", format_value(value)));
        }
        println!("{}", line);
    }
    Ok(())
}

/// Absent values render as a dash, never as zero.
fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "—".to_string(),
    }
}
