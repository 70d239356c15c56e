// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for the plan aggregate and the read-only KPI history
//! that the external simulation engine records per round. The interface lives
//! in the domain layer; implementations live in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `PlanRepository` | `PlanDocument`, `KpiSnapshot` | `InMemoryPlanRepository`, `LocalPlanRepository`, `PostgresPlanRepository` |
//!
//! ## Versioning contract
//!
//! Plans are append-only: `save_plan` always inserts a new version record and
//! never updates an existing one. In the same locked step that reads the
//! lineage's latest stored version, a backend must reject
//!
//! - a `status` that may not follow the latest stored status
//!   ([`RepositoryError::InvalidTransition`]), and
//! - a `version` that is not exactly one more than the latest stored version
//!   ([`RepositoryError::ValidationRejected`]), so lineages stay gapless.
//!
//! Stored records that cannot be decoded on the way out are reported as
//! [`RepositoryError::Unavailable`].

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::kpi::KpiSnapshot;
use crate::domain::plan::{status_label, PersistedPlanDocument, PlanDocument, PlanStatus, Round, TeamId};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    Local(PathBuf),
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub connection_string: String,
}

#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Latest version of the (team, round) lineage. `Ok(None)` means no plan yet.
    async fn load_active_plan(&self, team_id: &TeamId, round: Round) -> Result<Option<PlanDocument>, RepositoryError>;

    /// Append a new version. The record id is assigned by the store.
    async fn save_plan(&self, document: &PlanDocument) -> Result<PersistedPlanDocument, RepositoryError>;

    /// Every stored version of the lineage, oldest first.
    async fn load_lineage(&self, team_id: &TeamId, round: Round) -> Result<Vec<PlanDocument>, RepositoryError>;

    /// KPI snapshots recorded for the team, one per completed round. May be empty.
    async fn load_team_history(&self, team_id: &TeamId) -> Result<Vec<KpiSnapshot>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Rejected by repository: {0}")]
    ValidationRejected(String),

    #[error("Stored plan is {}, cannot save it as {requested}", status_label(.latest))]
    InvalidTransition {
        latest: Option<PlanStatus>,
        requested: PlanStatus,
    },
}

impl RepositoryError {
    /// Lineage check shared by every backend, run against the latest stored
    /// `(version, status)` while the lineage is locked for the write.
    ///
    /// The status is checked first: a stale document saved over a locked
    /// lineage reports the lock, not the version gap.
    pub fn check_next_version(
        latest: Option<(u32, PlanStatus)>,
        candidate_version: u32,
        candidate_status: PlanStatus,
    ) -> Result<(), RepositoryError> {
        let latest_status = latest.map(|(_, status)| status);
        if !PlanStatus::can_follow(latest_status, candidate_status) {
            return Err(RepositoryError::InvalidTransition {
                latest: latest_status,
                requested: candidate_status,
            });
        }

        let expected = latest.map(|(version, _)| version).unwrap_or(0) + 1;
        if candidate_version != expected {
            return Err(RepositoryError::ValidationRejected(format!(
                "version {} is out of sequence, expected {}",
                candidate_version, expected
            )));
        }
        Ok(())
    }

    /// A stored record that no longer decodes.
    pub fn corrupt(what: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        RepositoryError::Unavailable(format!("Corrupt stored {}: {}", what, err))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() || db.is_check_violation() => {
                RepositoryError::ValidationRejected(db.to_string())
            }
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::corrupt("record", err)
    }
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_next_version() {
        use PlanStatus::*;
        assert!(RepositoryError::check_next_version(None, 1, Draft).is_ok());
        assert!(RepositoryError::check_next_version(Some((2, Draft)), 3, Submitted).is_ok());
        assert!(matches!(
            RepositoryError::check_next_version(Some((2, Draft)), 2, Draft),
            Err(RepositoryError::ValidationRejected(_))
        ));
        assert!(RepositoryError::check_next_version(None, 2, Draft).is_err());
    }

    #[test]
    fn test_locked_lineage_reported_before_version_gap() {
        let result = RepositoryError::check_next_version(Some((3, PlanStatus::Submitted)), 2, PlanStatus::Draft);
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidTransition {
                latest: Some(PlanStatus::Submitted),
                requested: PlanStatus::Draft,
            })
        ));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Stored plan is submitted, cannot save it as draft"
        );
    }

    #[test]
    fn test_decode_error_is_unavailable() {
        let err: RepositoryError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, RepositoryError::Unavailable(_)));
    }
}
