// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process service wiring
//!
//! Builds the planner services from the loaded configuration so every
//! command runs against the configured store directly.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::warn;

use stratplan_core::application::repository_factory::create_plan_repository;
use stratplan_core::application::{AdvisoryService, KpiHistoryService, PlanLifecycleService};
use stratplan_core::domain::advisor::SuggestionService;
use stratplan_core::domain::planner_config::{PlannerConfig, PlannerConfigManifest, StorageKind};
use stratplan_core::domain::repository::PlanRepository;
use stratplan_core::infrastructure::advisor::LlmSuggestionService;

pub struct EmbeddedPlanner {
    pub config: PlannerConfig,
    pub lifecycle: PlanLifecycleService,
    pub history: KpiHistoryService,
    pub advisory: AdvisoryService,
}

impl EmbeddedPlanner {
    pub async fn new(manifest: PlannerConfigManifest) -> Result<Self> {
        manifest.validate().context("Configuration validation failed")?;
        let config = manifest.spec;

        if config.storage.backend == StorageKind::Memory {
            warn!("In-memory storage selected: nothing will be kept after this command exits");
        }

        let backend = config.storage.to_backend()?;
        let repository = create_plan_repository(&backend)
            .await
            .context("Failed to open plan storage")?;

        let advisor = match LlmSuggestionService::from_config(&config) {
            Ok(Some(service)) => Some(Arc::new(service) as Arc<dyn SuggestionService>),
            Ok(None) => None,
            Err(e) => {
                warn!("Advisor disabled: {:#}", e);
                None
            }
        };

        Ok(Self::with_repository(config, repository, advisor))
    }

    pub fn with_repository(
        config: PlannerConfig,
        repository: Arc<dyn PlanRepository>,
        advisor: Option<Arc<dyn SuggestionService>>,
    ) -> Self {
        Self {
            lifecycle: PlanLifecycleService::from_config(repository.clone(), &config),
            history: KpiHistoryService::new(repository),
            advisory: AdvisoryService::from_config(advisor, &config),
            config,
        }
    }
}
