// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain model: the plan aggregate, KPI history, repository and advisory
//! contracts, and the planner configuration manifest.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Types and invariants of the planning domain

pub mod advisor;
pub mod kpi;
pub mod plan;
pub mod planner_config;
pub mod repository;
