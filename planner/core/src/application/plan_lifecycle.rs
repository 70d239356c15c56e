// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Plan Lifecycle Service
//!
//! Loads, edits and saves a team's plan for one round.
//!
//! - Edits (`update_*`, `set_epicenter`) are pure: they return a new document
//!   and leave the input untouched, on success and on failure alike.
//! - `load_or_init` and `save` do exactly one repository round-trip each. A
//!   repository failure is returned as-is; nothing is retried.
//! - Every save appends version `previous + 1`. The status is checked twice:
//!   here against the status the caller last loaded, and by the repository
//!   against the latest stored status, so a stale document can never add a
//!   draft to a submitted lineage. Both report `InvalidTransition`.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Plan status transitions, versioning and schema-checked edits

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::plan::{
    ChampionshipId, PersistedPlanDocument, PlanDocument, PlanError, PlanStatus, Round, TeamId, Visibility,
};
use crate::domain::planner_config::PlannerConfig;
use crate::domain::repository::{PlanRepository, RepositoryError};

pub struct PlanLifecycleService {
    repository: Arc<dyn PlanRepository>,
    championship_id: ChampionshipId,
    step_count: u8,
}

impl PlanLifecycleService {
    pub fn new(repository: Arc<dyn PlanRepository>, championship_id: ChampionshipId, step_count: u8) -> Self {
        Self {
            repository,
            championship_id,
            step_count,
        }
    }

    pub fn from_config(repository: Arc<dyn PlanRepository>, config: &PlannerConfig) -> Self {
        Self::new(
            repository,
            ChampionshipId::new(config.competition.championship_id.clone()),
            config.wizard.step_count,
        )
    }

    pub fn step_count(&self) -> u8 {
        self.step_count
    }

    /// Latest version of the team's plan for `round`, or a fresh default
    /// document (version 0) when nothing was saved yet.
    pub async fn load_or_init(&self, team_id: &TeamId, round: Round) -> Result<PlanDocument, PlanError> {
        if round == 0 {
            return Err(PlanError::InvalidRound(round));
        }

        match self.repository.load_active_plan(team_id, round).await? {
            Some(doc) => {
                doc.data.validate_steps(self.step_count)?;
                debug!(
                    team_id = %team_id,
                    round,
                    version = doc.version,
                    status = %doc.status,
                    "Loaded active plan"
                );
                Ok(doc)
            }
            None => {
                debug!(team_id = %team_id, round, "No plan yet, starting from defaults");
                Ok(PlanDocument::new(self.championship_id.clone(), team_id.clone(), round))
            }
        }
    }

    pub fn update_step(&self, doc: &PlanDocument, step_index: u8, text: &str) -> Result<PlanDocument, PlanError> {
        let mut updated = doc.clone();
        updated.set_step(step_index, text, self.step_count)?;
        Ok(updated)
    }

    pub fn update_canvas_block(&self, doc: &PlanDocument, block_name: &str, text: &str) -> Result<PlanDocument, PlanError> {
        let mut updated = doc.clone();
        updated.set_canvas_block(block_name, text)?;
        Ok(updated)
    }

    pub fn update_empathy_block(&self, doc: &PlanDocument, block_name: &str, text: &str) -> Result<PlanDocument, PlanError> {
        let mut updated = doc.clone();
        updated.set_empathy_block(block_name, text)?;
        Ok(updated)
    }

    pub fn set_epicenter(&self, doc: &PlanDocument, value: &str) -> Result<PlanDocument, PlanError> {
        let mut updated = doc.clone();
        updated.set_epicenter(value)?;
        Ok(updated)
    }

    /// Persist `doc` as the next version of its lineage with `target_status`.
    ///
    /// `doc` itself is never modified, so after a failure the caller can retry
    /// the same call unchanged.
    pub async fn save(&self, doc: &PlanDocument, target_status: PlanStatus) -> Result<PersistedPlanDocument, PlanError> {
        let current = doc.persisted_status();
        if !PlanStatus::can_follow(current, target_status) {
            warn!(
                team_id = %doc.team_id,
                round = doc.round,
                version = doc.version,
                requested = %target_status,
                "Rejected plan status transition"
            );
            return Err(PlanError::InvalidTransition {
                current,
                requested: target_status,
            });
        }
        doc.data.validate_steps(self.step_count)?;

        let candidate = Self::next_version(doc, target_status);
        let persisted = self
            .repository
            .save_plan(&candidate)
            .await
            .map_err(|e| match e {
                RepositoryError::InvalidTransition { latest, requested } => {
                    warn!(
                        team_id = %doc.team_id,
                        round = doc.round,
                        version = candidate.version,
                        requested = %requested,
                        "Stored plan status rejects the save"
                    );
                    PlanError::InvalidTransition {
                        current: latest,
                        requested,
                    }
                }
                other => {
                    warn!(
                        team_id = %doc.team_id,
                        round = doc.round,
                        version = candidate.version,
                        "Plan save failed: {}",
                        other
                    );
                    PlanError::Repository(other)
                }
            })?;

        info!(
            team_id = %persisted.team_id,
            round = persisted.round,
            version = persisted.version(),
            status = %persisted.status(),
            "Saved plan version"
        );
        Ok(persisted)
    }

    /// Explicit submission: the lineage becomes read-only to the team.
    pub async fn submit(&self, doc: &PlanDocument) -> Result<PersistedPlanDocument, PlanError> {
        self.save(doc, PlanStatus::Submitted).await
    }

    /// Every stored version of the lineage, oldest first.
    pub async fn lineage(&self, team_id: &TeamId, round: Round) -> Result<Vec<PlanDocument>, PlanError> {
        Ok(self.repository.load_lineage(team_id, round).await?)
    }

    fn next_version(doc: &PlanDocument, status: PlanStatus) -> PlanDocument {
        PlanDocument {
            id: None,
            version: doc.version + 1,
            status,
            visibility: Visibility::Private,
            is_template: false,
            shared_with: Vec::new(),
            saved_at: Some(Utc::now()),
            ..doc.clone()
        }
    }
}
