//! Remediation signal types.
//!
//! A `RemediationSignal` bundles the detected violation, the processing
//! activity it occurred in, the governing framework and an urgency level.
//! Signals are immutable once created; every downstream stage reads them,
//! none mutates them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Risk/urgency level, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Parse a risk level from free text (advisory payloads use plain words).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Hours until a human task for this level is due.
    pub fn due_hours(&self) -> i64 {
        match self {
            Self::Critical => 8,
            Self::High => 24,
            Self::Medium => 48,
            Self::Low => 72,
        }
    }
}

/// A detected compliance violation with its remediation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub description: String,
    pub risk_level: RiskLevel,
    /// Framework identifier, e.g. "gdpr_eu" or "pdpa_singapore"
    pub framework: String,
    /// Free-text remediation actions proposed for this violation
    #[serde(default)]
    pub remediation_actions: Vec<String>,
    /// Categories of data involved, e.g. "personal", "health"
    #[serde(default)]
    pub data_types: Vec<String>,
    /// Parties that received the affected data
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub cross_border_transfer: bool,
    #[serde(default)]
    pub automated_decision_making: bool,
}

impl Violation {
    pub fn new(id: impl Into<String>, description: impl Into<String>, risk_level: RiskLevel) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            risk_level,
            framework: String::new(),
            remediation_actions: Vec::new(),
            data_types: Vec::new(),
            recipients: Vec::new(),
            cross_border_transfer: false,
            automated_decision_making: false,
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = framework.into();
        self
    }

    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.remediation_actions = actions;
        self
    }

    pub fn with_data_types(mut self, data_types: Vec<String>) -> Self {
        self.data_types = data_types;
        self
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    pub fn with_cross_border_transfer(mut self, flag: bool) -> Self {
        self.cross_border_transfer = flag;
        self
    }

    pub fn with_automated_decision_making(mut self, flag: bool) -> Self {
        self.automated_decision_making = flag;
        self
    }
}

/// The processing activity a violation was detected in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcessingActivity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    /// Systems that store or process the affected data
    #[serde(default)]
    pub systems: Vec<String>,
}

impl ProcessingActivity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            purpose: String::new(),
            systems: Vec::new(),
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn with_systems(mut self, systems: Vec<String>) -> Self {
        self.systems = systems;
        self
    }
}

/// The violation + activity + framework + urgency bundle handed to the engine.
///
/// Immutable once created. Urgency defaults to the violation's own risk level
/// when the caller does not override it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationSignal {
    pub violation: Violation,
    pub activity: ProcessingActivity,
    pub framework: String,
    pub urgency: RiskLevel,
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

impl RemediationSignal {
    pub fn new(violation: Violation, activity: ProcessingActivity) -> Self {
        let framework = violation.framework.clone();
        let urgency = violation.risk_level;
        Self {
            violation,
            activity,
            framework,
            urgency,
            context: HashMap::new(),
        }
    }

    pub fn with_urgency(mut self, urgency: RiskLevel) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// One-line description for logs and summaries.
    pub fn summary(&self) -> String {
        format!(
            "{} ({} risk, {}) in activity {}",
            self.violation.id,
            self.violation.risk_level.as_str(),
            self.framework,
            self.activity.id
        )
    }
}
