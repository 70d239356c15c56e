// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Plan Repository
//!
//! `PlanRepository` backed by the `business_plans` and `team_kpi_history`
//! tables (see `migrations/001_business_plans.sql`).
//!
//! Saves run in a transaction that locks the lineage's latest row before
//! checking its status and version sequence; the `(team_id, round, version)`
//! unique constraint catches the first save of a lineage racing with another.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use super::PlanRecord;
use crate::domain::kpi::KpiSnapshot;
use crate::domain::plan::{PersistedPlanDocument, PlanDocument, PlanId, PlanStatus, Round, TeamId, Visibility};
use crate::domain::repository::{PlanRepository, RepositoryError};

const PLAN_COLUMNS: &str = "id, championship_id, team_id, round, version, status, data, \
                            visibility, is_template, shared_with, saved_at";

pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_document(row: &PgRow) -> Result<PlanDocument, RepositoryError> {
        let status: String = row.try_get("status")?;
        let visibility: String = row.try_get("visibility")?;
        let round: i32 = row.try_get("round")?;
        let version: i32 = row.try_get("version")?;

        let record = PlanRecord {
            id: row.try_get("id")?,
            championship_id: row.try_get("championship_id")?,
            team_id: row.try_get("team_id")?,
            round: to_unsigned(round, "round")?,
            version: to_unsigned(version, "version")?,
            status: parse_status(&status)?,
            data: row.try_get("data")?,
            visibility: visibility
                .parse::<Visibility>()
                .map_err(|e| RepositoryError::corrupt("plan visibility", e))?,
            is_template: row.try_get("is_template")?,
            shared_with: row.try_get("shared_with")?,
            saved_at: Some(row.try_get("saved_at")?),
        };
        record.into_document()
    }
}

fn parse_status(status: &str) -> Result<PlanStatus, RepositoryError> {
    status
        .parse::<PlanStatus>()
        .map_err(|e| RepositoryError::corrupt("plan status", e))
}

fn to_unsigned(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| RepositoryError::corrupt(column, format!("negative value {}", value)))
}

fn to_signed(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::ValidationRejected(format!("{} {} is out of range", column, value)))
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn load_active_plan(&self, team_id: &TeamId, round: Round) -> Result<Option<PlanDocument>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM business_plans WHERE team_id = $1 AND round = $2 ORDER BY version DESC LIMIT 1",
            PLAN_COLUMNS
        ))
        .bind(team_id.as_str())
        .bind(to_signed(round, "round")?)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn save_plan(&self, document: &PlanDocument) -> Result<PersistedPlanDocument, RepositoryError> {
        let id = PlanId::new();
        let record = PlanRecord::from_document(document, id)?;
        let round = to_signed(record.round, "round")?;

        let mut tx = self.pool.begin().await?;

        let latest: Option<(i32, String)> = sqlx::query_as(
            r#"
            SELECT version, status FROM business_plans
            WHERE team_id = $1 AND round = $2
            ORDER BY version DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(&record.team_id)
        .bind(round)
        .fetch_optional(&mut *tx)
        .await?;

        let latest = latest
            .map(|(version, status)| -> Result<(u32, PlanStatus), RepositoryError> {
                Ok((to_unsigned(version, "version")?, parse_status(&status)?))
            })
            .transpose()?;
        RepositoryError::check_next_version(latest, record.version, record.status)?;

        let saved_at: chrono::DateTime<chrono::Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO business_plans (
                id, championship_id, team_id, round, version, status, data,
                visibility, is_template, shared_with, saved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, NOW()))
            RETURNING saved_at
            "#,
        )
        .bind(record.id)
        .bind(&record.championship_id)
        .bind(&record.team_id)
        .bind(round)
        .bind(to_signed(record.version, "version")?)
        .bind(record.status.as_str())
        .bind(&record.data)
        .bind(record.visibility.as_str())
        .bind(record.is_template)
        .bind(&record.shared_with)
        .bind(record.saved_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut stored = document.clone();
        stored.id = Some(id);
        stored.saved_at = Some(saved_at);
        PersistedPlanDocument::new(stored)
    }

    async fn load_lineage(&self, team_id: &TeamId, round: Round) -> Result<Vec<PlanDocument>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM business_plans WHERE team_id = $1 AND round = $2 ORDER BY version ASC",
            PLAN_COLUMNS
        ))
        .bind(team_id.as_str())
        .bind(to_signed(round, "round")?)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_document).collect()
    }

    async fn load_team_history(&self, team_id: &TeamId) -> Result<Vec<KpiSnapshot>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT round, kpis FROM team_kpi_history
            WHERE team_id = $1
            ORDER BY round ASC
            "#,
        )
        .bind(team_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<KpiSnapshot, RepositoryError> {
                let round: i32 = row.try_get("round")?;
                let kpis: serde_json::Value = row.try_get("kpis")?;
                Ok(KpiSnapshot::new(to_unsigned(round, "round")?, kpis))
            })
            .collect()
    }
}
