use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    hub::HubConfig,
    logging::DEFAULT_LOG_FILTER,
    policy::{DEFAULT_SUPPORTED_API_VERSION, TypeInstanceBackend, VersionGate},
};

const SCHEMA_FILE_NAME: &str = "capact-policy.schema.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub policy: PolicySourceConfig,
    #[serde(default)]
    pub hub: Option<HubConfig>,
    #[serde(default)]
    pub backends: BackendsConfig,
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_logging_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_logging_retention_days() -> usize {
    7
}

fn default_enabled_true() -> bool {
    true
}

fn default_policy_path() -> PathBuf {
    PathBuf::from("./policy.yaml")
}

fn default_supported_api_version() -> String {
    DEFAULT_SUPPORTED_API_VERSION.to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

/// Where the Policy document lives and which `apiVersion` range it may use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySourceConfig {
    #[serde(default = "default_policy_path")]
    pub path: PathBuf,
    #[serde(default = "default_supported_api_version")]
    pub supported_api_version: String,
}

impl Default for PolicySourceConfig {
    fn default() -> Self {
        Self {
            path: default_policy_path(),
            supported_api_version: default_supported_api_version(),
        }
    }
}

impl PolicySourceConfig {
    pub fn version_gate(&self) -> Result<VersionGate> {
        VersionGate::parse(&self.supported_api_version).with_context(|| {
            format!(
                "failed to parse policy.supported_api_version '{}'",
                self.supported_api_version
            )
        })
    }
}

/// Storage backends that do not come from the Policy's TypeInstance rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default)]
    pub default: Option<TypeInstanceBackend>,
    #[serde(default)]
    pub aliases: BTreeMap<String, TypeInstanceBackend>,
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize config")?;

        if !config.policy.path.is_absolute() {
            config.policy.path = config_base.join(&config.policy.path);
        }
        config.policy.version_gate()?;

        Ok(config)
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join(SCHEMA_FILE_NAME);
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or {SCHEMA_FILE_NAME} next to it"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    if let Err(errors_iter) = compiled.validate(config_value) {
        let validation_errors: Vec<ValidationError> = errors_iter.collect();
        let messages: Vec<String> = validation_errors
            .into_iter()
            .map(|error| error.to_string())
            .collect();
        return Err(anyhow!("config validation failed: {}", messages.join("; ")));
    }
    Ok(())
}
