// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Advisory Service
//!
//! Best-effort AI assistance for the plan editor. Builds suggestion and audit
//! requests from a [`PlanDocument`] and the team's [`HistoryTable`], and turns
//! any advisor failure into the configured fallback message. Nothing here can
//! fail a lifecycle operation; accepted suggestions go through
//! `PlanLifecycleService::update_step` like any other edit.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Degrade advisory failures to a non-fatal fallback

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::advisor::{AuditRequest, SuggestionRequest, SuggestionService};
use crate::domain::kpi::HistoryTable;
use crate::domain::plan::PlanDocument;
use crate::domain::planner_config::{PlannerConfig, WizardConfig};

/// Advisor output as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    pub text: String,

    /// True when `text` is the fallback message rather than advisor output.
    pub is_fallback: bool,
}

pub struct AdvisoryService {
    advisor: Option<Arc<dyn SuggestionService>>,
    wizard: WizardConfig,
    branch: String,
    fallback_message: String,
}

impl AdvisoryService {
    pub fn new(
        advisor: Option<Arc<dyn SuggestionService>>,
        wizard: WizardConfig,
        branch: impl Into<String>,
        fallback_message: impl Into<String>,
    ) -> Self {
        Self {
            advisor,
            wizard,
            branch: branch.into(),
            fallback_message: fallback_message.into(),
        }
    }

    pub fn from_config(advisor: Option<Arc<dyn SuggestionService>>, config: &PlannerConfig) -> Self {
        Self::new(
            advisor,
            config.wizard.clone(),
            config.competition.branch.clone(),
            config.advisor.fallback_message.clone(),
        )
    }

    /// Propose content for `domain_hint` (a block or field name) on wizard step `step_index`.
    pub async fn suggest(&self, doc: &PlanDocument, step_index: u8, domain_hint: &str, context_prompt: &str) -> Advice {
        let Some(advisor) = &self.advisor else {
            return self.fallback();
        };

        let request = SuggestionRequest {
            step_label: self.wizard.label(step_index),
            domain_hint: domain_hint.to_string(),
            current_state_json: doc.snapshot_json().to_string(),
            context_prompt: context_prompt.to_string(),
            branch: self.branch.clone(),
        };

        match advisor.suggest_field(&request).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(team_id = %doc.team_id, round = doc.round, step_index, "Advisor suggestion received");
                Advice { text, is_fallback: false }
            }
            Ok(_) => {
                warn!(team_id = %doc.team_id, round = doc.round, "Advisor returned an empty suggestion");
                self.fallback()
            }
            Err(e) => {
                warn!(team_id = %doc.team_id, round = doc.round, "Advisor suggestion failed: {}", e);
                self.fallback()
            }
        }
    }

    /// Critique the plan for `step_index` against the team's KPI history.
    pub async fn audit(&self, doc: &PlanDocument, step_index: u8, history: &HistoryTable) -> Advice {
        let Some(advisor) = &self.advisor else {
            return self.fallback();
        };

        let request = AuditRequest {
            step_label: self.wizard.label(step_index),
            plan_snapshot_json: doc.snapshot_json().to_string(),
            history: history_json(history).to_string(),
        };

        match advisor.audit_plan(&request).await {
            Ok(text) if !text.trim().is_empty() => Advice { text, is_fallback: false },
            Ok(_) => self.fallback(),
            Err(e) => {
                warn!(team_id = %doc.team_id, round = doc.round, "Advisor audit failed: {}", e);
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Advice {
        Advice {
            text: self.fallback_message.clone(),
            is_fallback: true,
        }
    }
}

/// `[{ "round": n, "indicators": { name: value, … } }, …]`, absent values omitted.
pub fn history_json(history: &HistoryTable) -> Value {
    let rounds: Vec<Value> = history
        .rounds()
        .into_iter()
        .map(|round| {
            json!({
                "round": round,
                "indicators": history.financial_summary(round).unwrap_or_default(),
            })
        })
        .collect();
    Value::Array(rounds)
}
