// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the stratplan CLI

pub mod advise;
pub mod config;
pub mod history;
pub mod plan;

pub use self::advise::AdviseCommand;
pub use self::config::ConfigCommand;
pub use self::history::HistoryCommand;
pub use self::plan::PlanCommand;
