// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! LLM-backed [`SuggestionService`].
//!
//! Renders the request through [`PromptTemplateEngine`] and sends it to the
//! provider the registry resolves for the configured model alias.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::llm::ProviderRegistry;
use super::prompt_templates::PromptTemplateEngine;
use crate::domain::advisor::{AuditRequest, GenerationOptions, LLMError, SuggestionRequest, SuggestionService};
use crate::domain::planner_config::{AdvisorConfig, PlannerConfig};

pub struct LlmSuggestionService {
    registry: Arc<ProviderRegistry>,
    templates: PromptTemplateEngine,
    model_alias: String,
    options: GenerationOptions,
}

impl LlmSuggestionService {
    pub fn new(registry: Arc<ProviderRegistry>, templates: PromptTemplateEngine, config: &AdvisorConfig) -> Self {
        Self {
            registry,
            templates,
            model_alias: config.model_alias.clone(),
            options: GenerationOptions {
                max_tokens: Some(config.max_tokens),
                temperature: Some(config.temperature),
            },
        }
    }

    /// `None` when no provider is configured, so callers go straight to the fallback message.
    pub fn from_config(config: &PlannerConfig) -> anyhow::Result<Option<Self>> {
        let registry = ProviderRegistry::from_config(config)?;
        if registry.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new(
            Arc::new(registry),
            PromptTemplateEngine::new()?,
            &config.advisor,
        )))
    }

    async fn complete(&self, prompt: String) -> Result<String, LLMError> {
        let response = self
            .registry
            .generate(&self.model_alias, &prompt, &self.options)
            .await?;
        debug!(
            provider = %response.provider,
            model = %response.model,
            finish_reason = ?response.finish_reason,
            "Advisor completion received"
        );
        Ok(response.text.trim().to_string())
    }
}

#[async_trait]
impl SuggestionService for LlmSuggestionService {
    async fn suggest_field(&self, request: &SuggestionRequest) -> Result<String, LLMError> {
        let prompt = self
            .templates
            .render_suggestion(request)
            .map_err(|e| LLMError::InvalidInput(e.to_string()))?;
        self.complete(prompt).await
    }

    async fn audit_plan(&self, request: &AuditRequest) -> Result<String, LLMError> {
        let prompt = self
            .templates
            .render_audit(request)
            .map_err(|e| LLMError::InvalidInput(e.to_string()))?;
        self.complete(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::advisor::{FinishReason, GenerationResponse, LLMProvider};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLMProvider for RecordingProvider {
        async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<GenerationResponse, LLMError> {
            assert_eq!(options.max_tokens, Some(256));
            self.prompts.lock().push(prompt.to_string());
            Ok(GenerationResponse {
                text: "  Sell through distributors.\n".to_string(),
                provider: "recording".to_string(),
                model: "test".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    fn advisor_config() -> AdvisorConfig {
        serde_yaml::from_str("model_alias: coach\nmax_tokens: 256").unwrap()
    }

    #[tokio::test]
    async fn test_suggest_field_renders_and_trims() {
        let provider = Arc::new(RecordingProvider::default());
        let mut registry = ProviderRegistry::new(0, 0, None);
        registry.register("recording", &["coach"], provider.clone());

        let service = LlmSuggestionService::new(
            Arc::new(registry),
            PromptTemplateEngine::new().unwrap(),
            &advisor_config(),
        );
        let text = service
            .suggest_field(&SuggestionRequest {
                step_label: "Channels".to_string(),
                domain_hint: "channels".to_string(),
                branch: "commerce".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(text, "Sell through distributors.");
        let prompts = provider.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("simulated commerce company"));
    }

    #[tokio::test]
    async fn test_unknown_alias_surfaces_error() {
        let service = LlmSuggestionService::new(
            Arc::new(ProviderRegistry::new(0, 0, None)),
            PromptTemplateEngine::new().unwrap(),
            &advisor_config(),
        );
        let result = service.audit_plan(&AuditRequest::default()).await;
        assert!(matches!(result, Err(LLMError::ModelNotFound(_))));
    }
}
