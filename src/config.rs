//! Engine configuration.
//!
//! One `EngineConfig` is constructed at process start (from defaults, a YAML
//! file, or builder calls) and passed by reference to every component. There
//! is no global configuration access.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::EngineError;

/// Advisory service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    /// Endpoint of the advisory service; `None` disables the advisory
    /// attempt and every decision takes the rule-based path.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_advisory_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_advisory_model() -> String {
    "advisory-default".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_advisory_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Named queue references for workflow hand-off messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_main_queue")]
    pub main_queue: String,
    #[serde(default = "default_high_priority_queue")]
    pub high_priority_queue: String,
    #[serde(default = "default_human_queue")]
    pub human_intervention_queue: String,
    #[serde(default = "default_dead_letter_queue")]
    pub dead_letter_queue: String,
}

fn default_main_queue() -> String {
    "remediation-workflows".to_string()
}

fn default_high_priority_queue() -> String {
    "remediation-workflows-high".to_string()
}

fn default_human_queue() -> String {
    "remediation-human-intervention".to_string()
}

fn default_dead_letter_queue() -> String {
    "remediation-workflows-dlq".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            main_queue: default_main_queue(),
            high_priority_queue: default_high_priority_queue(),
            human_intervention_queue: default_human_queue(),
            dead_letter_queue: default_dead_letter_queue(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on concurrently processed signals
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_workflows: usize,
    #[serde(default = "default_timeout_hours")]
    pub default_timeout_hours: u32,
    #[serde(default = "default_enable_notifications")]
    pub enable_notifications: bool,
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub queues: QueueConfig,
}

fn default_max_concurrent() -> usize {
    10
}

fn default_timeout_hours() -> u32 {
    72
}

fn default_enable_notifications() -> bool {
    true
}

fn default_max_retry_attempts() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_workflows: default_max_concurrent(),
            default_timeout_hours: default_timeout_hours(),
            enable_notifications: default_enable_notifications(),
            max_retry_attempts: default_max_retry_attempts(),
            advisory: AdvisoryConfig::default(),
            queues: QueueConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| EngineError::ConfigParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a file when given, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, EngineError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn with_max_concurrent_workflows(mut self, limit: usize) -> Self {
        self.max_concurrent_workflows = limit.max(1);
        self
    }

    pub fn with_notifications_enabled(mut self, enabled: bool) -> Self {
        self.enable_notifications = enabled;
        self
    }

    pub fn with_advisory_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.advisory.endpoint = Some(endpoint.into());
        self
    }
}
