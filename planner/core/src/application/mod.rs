// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod advisory;
pub mod kpi_history;
pub mod plan_lifecycle;
pub mod repository_factory;

// Re-export services for convenience
pub use advisory::{Advice, AdvisoryService};
pub use kpi_history::{HistoryError, KpiHistoryService};
pub use plan_lifecycle::PlanLifecycleService;
