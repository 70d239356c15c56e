// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain `LLMProvider` interface and one
// vendor API. The registry resolves the advisor's model alias to an adapter.

pub mod ollama;
pub mod openai;
pub mod registry;

pub use registry::ProviderRegistry;
