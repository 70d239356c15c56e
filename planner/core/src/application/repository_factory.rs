// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates the concrete `PlanRepository` for the configured storage backend.
//! The domain layer only knows the trait; this is the one place that picks
//! an implementation.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wire a storage backend to the plan repository contract

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::domain::repository::{PlanRepository, StorageBackend};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::local::LocalPlanRepository;
use crate::infrastructure::repositories::postgres_plan::PostgresPlanRepository;
use crate::infrastructure::repositories::InMemoryPlanRepository;

/// Creates a PlanRepository implementation based on the configured backend
pub async fn create_plan_repository(backend: &StorageBackend) -> Result<Arc<dyn PlanRepository>> {
    match backend {
        StorageBackend::InMemory => {
            info!("Using in-memory plan repository");
            Ok(Arc::new(InMemoryPlanRepository::new()))
        }
        StorageBackend::Local(path) => {
            info!("Using local plan repository at {}", path.display());
            let repo = LocalPlanRepository::new(path)
                .with_context(|| format!("Failed to open local plan store at {}", path.display()))?;
            Ok(Arc::new(repo))
        }
        StorageBackend::PostgreSQL(config) => {
            info!("Using PostgreSQL plan repository");
            let db = Database::new(&config.connection_string)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.ensure_schema().await.context("Failed to prepare plan schema")?;
            Ok(Arc::new(PostgresPlanRepository::new(db.get_pool().clone())))
        }
    }
}
