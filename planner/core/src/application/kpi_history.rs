// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! KPI History Service
//!
//! Fetches a team's recorded KPI snapshots (one repository round-trip) and
//! aggregates them into a [`HistoryTable`] for the dashboard and for the
//! plan's financial-interpretation step.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::kpi::{aggregate, HistoryTable, KpiError};
use crate::domain::plan::TeamId;
use crate::domain::repository::{PlanRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Kpi(#[from] KpiError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct KpiHistoryService {
    repository: Arc<dyn PlanRepository>,
}

impl KpiHistoryService {
    pub fn new(repository: Arc<dyn PlanRepository>) -> Self {
        Self { repository }
    }

    pub async fn team_history(&self, team_id: &TeamId) -> Result<HistoryTable, HistoryError> {
        let snapshots = self.repository.load_team_history(team_id).await?;
        let table = aggregate(&snapshots)?;
        debug!(team_id = %team_id, rounds = table.len(), "Aggregated KPI history");
        Ok(table)
    }
}
