// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Advisory Interfaces (Anti-Corruption Layer)
//!
//! Two seams to text-generation vendors:
//!
//! - [`LLMProvider`] — raw completion call, implemented per vendor in
//!   `infrastructure/llm/`.
//! - [`SuggestionService`] — the plan-level contract the editing surface
//!   consumes: suggest the content of a field, or audit a plan snapshot.
//!
//! Suggestion output is advisory. The core never parses or validates it; a
//! caller that accepts a suggestion writes it into a step `text` like any
//! other edit.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Vendor-neutral contracts for AI assistance

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Domain interface for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError>;

    /// Check if provider is healthy and accessible
    async fn health_check(&self) -> Result<(), LLMError>;
}

/// Options for LLM generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: Option<f32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(1024),
            temperature: Some(0.7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,

    /// Provider type (e.g., "openai", "ollama")
    pub provider: String,

    pub model: String,

    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Ask for a proposed value of one plan field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// Label of the wizard step being edited.
    pub step_label: String,

    /// Which block or field the suggestion is for (e.g. "value_propositions").
    pub domain_hint: String,

    /// Current plan content as JSON.
    pub current_state_json: String,

    /// Free-form instruction from the editing surface.
    pub context_prompt: String,

    /// Business branch of the simulated company (industry, commerce, …).
    pub branch: String,
}

/// Ask for a critique of a plan snapshot against the team's KPI history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditRequest {
    pub step_label: String,
    pub plan_snapshot_json: String,

    /// Serialized KPI history the audit should take into account.
    pub history: String,
}

#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest_field(&self, request: &SuggestionRequest) -> Result<String, LLMError>;

    async fn audit_plan(&self, request: &AuditRequest) -> Result<String, LLMError>;
}
