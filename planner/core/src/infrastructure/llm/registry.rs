// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Model Alias Resolution and Provider Management
//
// Resolves model aliases to provider adapters and applies the advisor's
// retry and fallback policy.

use crate::domain::advisor::{GenerationOptions, GenerationResponse, LLMError, LLMProvider};
use crate::domain::planner_config::{resolve_secret, LLMProviderConfig, ModelConfig, PlannerConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::ollama::OllamaAdapter;
use super::openai::OpenAIAdapter;

/// Registry for managing LLM providers and resolving model aliases
pub struct ProviderRegistry {
    /// provider name -> adapter for its first model (used as fallback)
    providers: HashMap<String, Arc<dyn LLMProvider>>,

    /// alias -> (provider name, adapter bound to the aliased model)
    alias_map: HashMap<String, (String, Arc<dyn LLMProvider>)>,
    fallback_provider: Option<String>,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl ProviderRegistry {
    pub fn new(max_retries: u32, retry_delay_ms: u64, fallback_provider: Option<String>) -> Self {
        Self {
            providers: HashMap::new(),
            alias_map: HashMap::new(),
            fallback_provider,
            max_retries,
            retry_delay_ms,
        }
    }

    /// Create provider registry from planner configuration
    pub fn from_config(config: &PlannerConfig) -> anyhow::Result<Self> {
        let mut registry = Self::new(
            config.advisor.max_retries,
            config.advisor.retry_delay_ms,
            config.advisor.fallback_provider.clone(),
        );

        info!("Initializing LLM provider registry");

        for provider_config in &config.llm_providers {
            if !provider_config.enabled {
                info!("Provider '{}' disabled, skipping", provider_config.name);
                continue;
            }

            if let Err(e) = registry.add_provider(provider_config) {
                warn!("Failed to initialize provider '{}': {}", provider_config.name, e);
            }
        }

        if registry.providers.is_empty() {
            warn!("No LLM providers configured - advisor will answer with the fallback message");
        }

        Ok(registry)
    }

    fn add_provider(&mut self, config: &LLMProviderConfig) -> anyhow::Result<()> {
        let first = config
            .models
            .first()
            .ok_or_else(|| anyhow::anyhow!("No models configured"))?;
        let api_key = match &config.api_key {
            Some(key) => resolve_secret(key)?,
            None => String::new(),
        };

        self.providers
            .insert(config.name.clone(), Self::create_adapter(config, first, &api_key)?);

        for model_config in &config.models {
            info!(
                "Mapping alias '{}' -> {} ({})",
                model_config.alias, model_config.model, config.name
            );
            self.alias_map.insert(
                model_config.alias.clone(),
                (config.name.clone(), Self::create_adapter(config, model_config, &api_key)?),
            );
        }
        Ok(())
    }

    fn create_adapter(
        config: &LLMProviderConfig,
        model: &ModelConfig,
        api_key: &str,
    ) -> anyhow::Result<Arc<dyn LLMProvider>> {
        let endpoint = config.endpoint.clone();
        let provider: Arc<dyn LLMProvider> = match config.provider_type.as_str() {
            "ollama" => Arc::new(OllamaAdapter::new(endpoint, model.model.clone())),
            "openai" | "openai-compatible" => Arc::new(OpenAIAdapter::with_provider_type(
                endpoint,
                api_key.to_string(),
                model.model.clone(),
                &config.provider_type,
            )),
            other => anyhow::bail!("Unsupported provider type: {}", other),
        };
        Ok(provider)
    }

    /// Register an already-built adapter under `name`, answering for `aliases`.
    pub fn register(&mut self, name: &str, aliases: &[&str], provider: Arc<dyn LLMProvider>) {
        for alias in aliases {
            self.alias_map
                .insert(alias.to_string(), (name.to_string(), provider.clone()));
        }
        self.providers.insert(name.to_string(), provider);
    }

    /// Generate text using a model alias.
    ///
    /// The aliased provider gets `max_retries + 1` attempts with exponential
    /// backoff, then the fallback provider (if any) gets one.
    pub async fn generate(
        &self,
        alias: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let (provider_name, provider) = self
            .alias_map
            .get(alias)
            .ok_or_else(|| LLMError::ModelNotFound(format!("Model alias '{}' not found", alias)))?;

        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            match provider.generate(prompt, options).await {
                Ok(response) => {
                    info!(provider = %provider_name, "Generation successful on attempt {}", attempt + 1);
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        provider = %provider_name,
                        "Generation failed (attempt {}/{}): {}",
                        attempt + 1,
                        attempts,
                        e
                    );
                    let retryable = !matches!(e, LLMError::Authentication(_) | LLMError::InvalidInput(_));
                    last_error = Some(e);

                    if !retryable || attempt + 1 == attempts {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(
                        self.retry_delay_ms.saturating_mul(2_u64.saturating_pow(attempt)),
                    ))
                    .await;
                }
            }
        }

        if let Some(fallback) = self.fallback_provider.as_ref().filter(|f| *f != provider_name) {
            if let Some(fallback_provider) = self.providers.get(fallback) {
                info!("Trying fallback provider: {}", fallback);
                return fallback_provider.generate(prompt, options).await;
            }
        }

        Err(last_error.unwrap_or_else(|| LLMError::Provider("Unknown error".into())))
    }

    /// Check health of all providers
    pub async fn health_check_all(&self) -> HashMap<String, Result<(), LLMError>> {
        let mut results = HashMap::new();

        for (name, provider) in &self.providers {
            info!("Health checking provider: {}", name);
            results.insert(name.clone(), provider.health_check().await);
        }

        results
    }

    pub fn available_aliases(&self) -> Vec<String> {
        self.alias_map.keys().cloned().collect()
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias_map.contains_key(alias)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
