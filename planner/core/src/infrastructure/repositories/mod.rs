// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the domain `PlanRepository` contract.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve plan versions and KPI history
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **InMemoryPlanRepository** - HashMap-backed storage for tests and development
//! - **LocalPlanRepository** - one JSON file per plan version under a data directory
//! - **PostgresPlanRepository** - `business_plans` / `team_kpi_history` tables
//!
//! All backends append versions and never update them in place. File and SQL
//! backends store the record shape below and merge its `data` payload over the
//! plan defaults on the way out ([`PlanRecord::into_document`]).

pub mod local;
pub mod postgres_plan;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::kpi::KpiSnapshot;
use crate::domain::plan::{
    ChampionshipId, PersistedPlanDocument, PlanData, PlanDocument, PlanId, PlanStatus, Round, TeamId, Visibility,
};
use crate::domain::repository::{PlanRepository, RepositoryError};

/// Transport-agnostic persisted plan record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub id: Uuid,
    pub championship_id: String,
    pub team_id: String,
    pub round: Round,
    pub version: u32,
    pub status: PlanStatus,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PlanRecord {
    pub fn from_document(doc: &PlanDocument, id: PlanId) -> Result<Self, RepositoryError> {
        Ok(Self {
            id: id.0,
            championship_id: doc.championship_id.0.clone(),
            team_id: doc.team_id.0.clone(),
            round: doc.round,
            version: doc.version,
            status: doc.status,
            data: serde_json::to_value(&doc.data)?,
            visibility: doc.visibility,
            is_template: doc.is_template,
            shared_with: doc.shared_with.iter().map(|t| t.0.clone()).collect(),
            saved_at: doc.saved_at,
        })
    }

    /// Rebuild the domain document, filling anything missing from `data` with defaults.
    pub fn into_document(self) -> Result<PlanDocument, RepositoryError> {
        let data = PlanData::from_stored(self.data)?;
        Ok(PlanDocument {
            id: Some(PlanId(self.id)),
            championship_id: ChampionshipId(self.championship_id),
            team_id: TeamId(self.team_id),
            round: self.round,
            version: self.version,
            status: self.status,
            data,
            visibility: self.visibility,
            is_template: self.is_template,
            shared_with: self.shared_with.into_iter().map(TeamId).collect(),
            saved_at: self.saved_at,
        })
    }
}

type LineageKey = (TeamId, Round);

#[derive(Clone, Default)]
pub struct InMemoryPlanRepository {
    lineages: Arc<RwLock<HashMap<LineageKey, Vec<PlanDocument>>>>,
    history: Arc<RwLock<HashMap<TeamId, Vec<KpiSnapshot>>>>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a KPI snapshot for a team, as the simulation collector would.
    pub fn record_history(&self, team_id: &TeamId, snapshot: KpiSnapshot) {
        self.history.write().entry(team_id.clone()).or_default().push(snapshot);
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn load_active_plan(&self, team_id: &TeamId, round: Round) -> Result<Option<PlanDocument>, RepositoryError> {
        let lineages = self.lineages.read();
        Ok(lineages
            .get(&(team_id.clone(), round))
            .and_then(|versions| versions.last())
            .cloned())
    }

    async fn save_plan(&self, document: &PlanDocument) -> Result<PersistedPlanDocument, RepositoryError> {
        let mut lineages = self.lineages.write();
        let versions = lineages
            .entry((document.team_id.clone(), document.round))
            .or_default();
        RepositoryError::check_next_version(
            versions.last().map(|d| (d.version, d.status)),
            document.version,
            document.status,
        )?;

        let mut stored = document.clone();
        stored.id = Some(PlanId::new());
        versions.push(stored.clone());
        PersistedPlanDocument::new(stored)
    }

    async fn load_lineage(&self, team_id: &TeamId, round: Round) -> Result<Vec<PlanDocument>, RepositoryError> {
        let lineages = self.lineages.read();
        Ok(lineages.get(&(team_id.clone(), round)).cloned().unwrap_or_default())
    }

    async fn load_team_history(&self, team_id: &TeamId) -> Result<Vec<KpiSnapshot>, RepositoryError> {
        let history = self.history.read();
        Ok(history.get(team_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(version: u32) -> PlanDocument {
        let mut doc = PlanDocument::new(ChampionshipId::new("cup"), TeamId::new("team-a"), 1);
        doc.version = version;
        doc
    }

    #[tokio::test]
    async fn test_in_memory_append_and_load() {
        let repo = InMemoryPlanRepository::new();
        let team = TeamId::new("team-a");

        assert!(repo.load_active_plan(&team, 1).await.unwrap().is_none());

        let first = repo.save_plan(&draft(1)).await.unwrap();
        let second = repo.save_plan(&draft(2)).await.unwrap();
        assert_ne!(first.id(), second.id());

        let active = repo.load_active_plan(&team, 1).await.unwrap().unwrap();
        assert_eq!(active.version, 2);
        assert_eq!(repo.load_lineage(&team, 1).await.unwrap().len(), 2);
        assert!(repo.load_active_plan(&team, 2).await.unwrap().is_none());
    }

    #[test]
    fn test_in_memory_rejects_out_of_sequence() {
        let repo = InMemoryPlanRepository::new();
        assert!(matches!(
            tokio_test::block_on(repo.save_plan(&draft(2))),
            Err(RepositoryError::ValidationRejected(_))
        ));
        tokio_test::block_on(repo.save_plan(&draft(1))).unwrap();
        assert!(tokio_test::block_on(repo.save_plan(&draft(1))).is_err());
    }

    #[test]
    fn test_in_memory_checks_latest_status() {
        let repo = InMemoryPlanRepository::new();
        let mut submitted = draft(1);
        submitted.status = PlanStatus::Submitted;
        assert!(matches!(
            tokio_test::block_on(repo.save_plan(&submitted)),
            Err(RepositoryError::InvalidTransition { latest: None, .. })
        ));

        tokio_test::block_on(repo.save_plan(&draft(1))).unwrap();
        let mut submitted = draft(2);
        submitted.status = PlanStatus::Submitted;
        tokio_test::block_on(repo.save_plan(&submitted)).unwrap();

        assert!(matches!(
            tokio_test::block_on(repo.save_plan(&draft(3))),
            Err(RepositoryError::InvalidTransition {
                latest: Some(PlanStatus::Submitted),
                requested: PlanStatus::Draft,
            })
        ));
    }

    #[test]
    fn test_record_merges_defaults() {
        let record: PlanRecord = serde_json::from_value(serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "championshipId": "cup",
            "teamId": "team-a",
            "round": 2,
            "version": 3,
            "status": "submitted",
            "data": { "canvas": { "channels": "online" } }
        }))
        .unwrap();

        let doc = record.into_document().unwrap();
        assert_eq!(doc.version, 3);
        assert_eq!(doc.status, PlanStatus::Submitted);
        assert_eq!(doc.data.canvas.channels, "online");
        assert_eq!(doc.data.canvas.cost_structure, "");
        assert_eq!(doc.visibility, Visibility::Private);
        assert!(doc.shared_with.is_empty());
    }

    #[test]
    fn test_record_rejects_unknown_block() {
        let record: PlanRecord = serde_json::from_value(serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "championshipId": "cup",
            "teamId": "team-a",
            "round": 2,
            "version": 1,
            "status": "draft",
            "data": { "canvas": { "mascot": "owl" } }
        }))
        .unwrap();

        assert!(matches!(
            record.into_document(),
            Err(RepositoryError::Unavailable(_))
        ));
    }
}
