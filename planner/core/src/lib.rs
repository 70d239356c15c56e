// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stratplan core
//!
//! Business plan lifecycle (status state machine, append-only versioning,
//! schema-checked edits) and round KPI aggregation for the stratplan
//! competition toolkit.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, application services and persistence adapters

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
