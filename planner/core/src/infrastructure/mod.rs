// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod advisor;
pub mod db;
pub mod llm;
pub mod prompt_templates;
pub mod repositories;
