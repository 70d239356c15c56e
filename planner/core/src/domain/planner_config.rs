// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Planner Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing:
// - Competition context (championship, business branch)
// - Plan wizard layout (step count and labels)
// - Persistence backend (memory, local files, PostgreSQL)
// - LLM providers and advisor settings
// - Logging

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "stratplan/v1";
pub const KIND: &str = "PlannerConfig";

/// Upper bound on configurable wizard steps.
pub const MAX_WIZARD_STEPS: u8 = 20;

/// Top-level planner configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfigManifest {
    /// API version (must be "stratplan/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "PlannerConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: PlannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Content under `spec:`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub competition: CompetitionConfig,

    #[serde(default)]
    pub wizard: WizardConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub llm_providers: Vec<LLMProviderConfig>,

    #[serde(default)]
    pub advisor: AdvisorConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionConfig {
    /// Championship every new plan is attached to
    #[serde(default = "default_championship")]
    pub championship_id: String,

    /// Business branch passed to the advisor (industry, commerce, services, …)
    #[serde(default = "default_branch")]
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Number of narrative steps; valid step indices are 1..=step_count
    #[serde(default = "default_step_count")]
    pub step_count: u8,

    /// Optional human-readable label per step, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_labels: Vec<String>,
}

impl WizardConfig {
    /// Label of a step, falling back to "Step N".
    pub fn label(&self, index: u8) -> String {
        usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.step_labels.get(i))
            .cloned()
            .unwrap_or_else(|| format!("Step {}", index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    Local,
    Postgres,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,

    /// Root directory for the local backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// PostgreSQL URL (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

impl StorageConfig {
    pub fn to_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.backend {
            StorageKind::Memory => Ok(StorageBackend::InMemory),
            StorageKind::Local => {
                let path = match &self.path {
                    Some(p) => PathBuf::from(p),
                    None => default_data_dir()
                        .ok_or_else(|| anyhow::anyhow!("storage.path not set and no home directory found"))?,
                };
                Ok(StorageBackend::Local(path))
            }
            StorageKind::Postgres => {
                let raw = self
                    .connection_string
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("storage.connection_string is required for the postgres backend"))?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string: resolve_secret(raw)?,
                }))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Unique provider name (e.g., "ollama-local", "openai")
    pub name: String,

    /// Provider type: "ollama", "openai", "openai-compatible"
    #[serde(rename = "type")]
    pub provider_type: String,

    pub endpoint: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Alias the advisor refers to (e.g., "default", "fast")
    pub alias: String,

    /// Actual model identifier for the provider API
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default = "default_model_alias")]
    pub model_alias: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Provider tried once more when the aliased provider keeps failing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_provider: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Text shown instead of a suggestion when the advisor is unavailable
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_championship() -> String {
    "default".to_string()
}

fn default_branch() -> String {
    "industry".to_string()
}

fn default_step_count() -> u8 {
    5
}

fn default_model_alias() -> String {
    "default".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    500
}

fn default_fallback_message() -> String {
    "The advisor is unavailable right now. Please try again later.".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".stratplan").join("data"))
}

/// Resolve "env:VAR_NAME" references, pass anything else through.
pub fn resolve_secret(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name)
            .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
        None => Ok(value.to_string()),
    }
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            championship_id: default_championship(),
            branch: default_branch(),
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            step_count: default_step_count(),
            step_labels: vec![
                "Business Model Canvas".to_string(),
                "Empathy Map".to_string(),
                "Narrative Pillars".to_string(),
                "Strategic Epicenter".to_string(),
                "Financial Interpretation".to_string(),
            ],
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model_alias: default_model_alias(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            fallback_provider: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            fallback_message: default_fallback_message(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            competition: CompetitionConfig::default(),
            wizard: WizardConfig::default(),
            storage: StorageConfig::default(),
            llm_providers: vec![],
            advisor: AdvisorConfig::default(),
            observability: None,
        }
    }
}

impl Default for PlannerConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "stratplan".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: PlannerConfig::default(),
        }
    }
}

impl PlannerConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. STRATPLAN_CONFIG_PATH environment variable
    /// 2. ./stratplan.yaml (working directory)
    /// 3. ~/.stratplan/config.yaml (user home)
    /// 4. /etc/stratplan/config.yaml (system, Unix) or C:\ProgramData\Stratplan\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("STRATPLAN_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./stratplan.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".stratplan").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/stratplan/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Stratplan\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("STRATPLAN_DATA_DIR") {
            tracing::info!("Environment override: STRATPLAN_DATA_DIR={}", dir);
            self.spec.storage.backend = StorageKind::Local;
            self.spec.storage.path = Some(dir);
        }

        // Takes precedence over STRATPLAN_DATA_DIR
        if let Some(url) = lookup("STRATPLAN_DATABASE_URL") {
            tracing::info!("Environment override: STRATPLAN_DATABASE_URL=<redacted>");
            self.spec.storage.backend = StorageKind::Postgres;
            self.spec.storage.connection_string = Some(url);
        }

        if let Some(val) = lookup("STRATPLAN_WIZARD_STEPS") {
            match val.parse::<u8>() {
                Ok(steps) => {
                    tracing::info!("Environment override: STRATPLAN_WIZARD_STEPS={}", steps);
                    self.spec.wizard.step_count = steps;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for STRATPLAN_WIZARD_STEPS: '{}'. Expected an integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;

        if spec.competition.championship_id.is_empty() {
            anyhow::bail!("spec.competition.championship_id cannot be empty");
        }

        if spec.wizard.step_count == 0 || spec.wizard.step_count > MAX_WIZARD_STEPS {
            anyhow::bail!(
                "spec.wizard.step_count must be between 1 and {}, got {}",
                MAX_WIZARD_STEPS,
                spec.wizard.step_count
            );
        }

        if spec.wizard.step_labels.len() > usize::from(spec.wizard.step_count) {
            anyhow::bail!(
                "spec.wizard.step_labels has {} entries but only {} steps are configured",
                spec.wizard.step_labels.len(),
                spec.wizard.step_count
            );
        }

        match spec.storage.backend {
            StorageKind::Postgres if spec.storage.connection_string.is_none() => {
                anyhow::bail!("spec.storage.connection_string is required for the postgres backend");
            }
            StorageKind::Local if matches!(spec.storage.path.as_deref(), Some("")) => {
                anyhow::bail!("spec.storage.path cannot be empty");
            }
            _ => {}
        }

        for provider in &spec.llm_providers {
            if provider.name.is_empty() {
                anyhow::bail!("LLM provider name cannot be empty");
            }

            if provider.endpoint.is_empty() {
                anyhow::bail!("LLM provider endpoint cannot be empty for: {}", provider.name);
            }

            if provider.models.is_empty() {
                anyhow::bail!("LLM provider must have at least one model: {}", provider.name);
            }

            for model in &provider.models {
                if model.alias.is_empty() {
                    anyhow::bail!("Model alias cannot be empty in provider: {}", provider.name);
                }

                if model.model.is_empty() {
                    anyhow::bail!("Model identifier cannot be empty for alias: {}", model.alias);
                }
            }
        }

        if let Some(fallback) = &spec.advisor.fallback_provider {
            if !spec.llm_providers.iter().any(|p| &p.name == fallback) {
                anyhow::bail!("Fallback provider '{}' not found in llm_providers", fallback);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = PlannerConfigManifest::default();
        assert_eq!(manifest.api_version, "stratplan/v1");
        assert_eq!(manifest.kind, "PlannerConfig");
        assert!(!manifest.metadata.name.is_empty());
        assert_eq!(manifest.spec.wizard.step_count, 5);
        assert_eq!(manifest.spec.storage.backend, StorageKind::Memory);
        assert!(manifest.spec.llm_providers.is_empty());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r#"
apiVersion: stratplan/v1
kind: PlannerConfig
metadata:
  name: classroom-a
spec:
  competition:
    championship_id: cup-2026
  storage:
    backend: local
    path: /tmp/stratplan
  llm_providers:
    - name: ollama
      type: ollama
      endpoint: http://localhost:11434
      models:
        - alias: default
          model: llama3.2
"#;
        let manifest = PlannerConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.competition.championship_id, "cup-2026");
        assert_eq!(manifest.spec.competition.branch, "industry");
        assert_eq!(manifest.spec.wizard.step_count, 5);
        assert!(manifest.spec.llm_providers[0].enabled);
        assert_eq!(manifest.spec.advisor.model_alias, "default");
        assert_eq!(
            manifest.spec.storage.to_backend().unwrap(),
            StorageBackend::Local(PathBuf::from("/tmp/stratplan"))
        );
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut manifest = PlannerConfigManifest::default();
        manifest.metadata.name = "test-node".to_string();
        manifest.spec.wizard.step_count = 4;
        manifest.spec.wizard.step_labels.truncate(4);

        let yaml = serde_yaml::to_string(&manifest).unwrap();
        let parsed = PlannerConfigManifest::from_yaml_str(&yaml).unwrap();

        assert_eq!(parsed.metadata.name, "test-node");
        assert_eq!(parsed.spec.wizard.step_count, 4);
        assert_eq!(parsed.spec.wizard.step_labels.len(), 4);
    }

    #[test]
    fn test_validation() {
        let mut manifest = PlannerConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.wizard.step_count = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.wizard.step_count = 21;
        assert!(manifest.validate().is_err());
        manifest.spec.wizard.step_count = 5;

        manifest.spec.storage.backend = StorageKind::Postgres;
        assert!(manifest.validate().is_err());
        manifest.spec.storage.connection_string = Some("postgres://localhost/plans".to_string());
        assert!(manifest.validate().is_ok());

        manifest.spec.llm_providers.push(LLMProviderConfig {
            name: "invalid".to_string(),
            provider_type: "openai".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            enabled: true,
            models: vec![],
        });
        assert!(manifest.validate().is_err());
        manifest.spec.llm_providers.clear();

        manifest.spec.advisor.fallback_provider = Some("missing".to_string());
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STRATPLAN_DATA_DIR", "/srv/plans"),
            ("STRATPLAN_WIZARD_STEPS", "7"),
        ]);
        let mut manifest = PlannerConfigManifest::default();
        manifest.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(manifest.spec.storage.backend, StorageKind::Local);
        assert_eq!(manifest.spec.storage.path.as_deref(), Some("/srv/plans"));
        assert_eq!(manifest.spec.wizard.step_count, 7);

        let vars: HashMap<&str, &str> = HashMap::from([
            ("STRATPLAN_DATA_DIR", "/srv/plans"),
            ("STRATPLAN_DATABASE_URL", "postgres://db/plans"),
            ("STRATPLAN_WIZARD_STEPS", "many"),
        ]);
        let mut manifest = PlannerConfigManifest::default();
        manifest.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(manifest.spec.storage.backend, StorageKind::Postgres);
        assert_eq!(manifest.spec.wizard.step_count, 5);
    }

    #[test]
    fn test_wizard_labels() {
        let wizard = WizardConfig::default();
        assert_eq!(wizard.label(1), "Business Model Canvas");
        assert_eq!(wizard.label(5), "Financial Interpretation");
        assert_eq!(wizard.label(9), "Step 9");
        assert_eq!(wizard.label(0), "Step 0");
    }

    #[test]
    fn test_resolve_secret_passthrough() {
        assert_eq!(resolve_secret("plain").unwrap(), "plain");
        assert!(resolve_secret("env:STRATPLAN_TEST_SURELY_UNSET_VAR").is_err());
    }
}
