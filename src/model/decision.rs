//! Remediation decision types.

use serde::{Deserialize, Serialize};

use super::signal::RiskLevel;

/// The chosen remediation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationType {
    /// Fully automated execution, no human in the path
    Automatic,
    /// Automated execution gated by human review/approval
    HumanInLoop,
    /// Humans perform the remediation; the engine only coordinates
    ManualOnly,
}

impl RemediationType {
    /// Parse a remediation type from free text (advisory payloads).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "automatic" => Some(Self::Automatic),
            "human_in_loop" => Some(Self::HumanInLoop),
            "manual_only" => Some(Self::ManualOnly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::HumanInLoop => "human_in_loop",
            Self::ManualOnly => "manual_only",
        }
    }
}

/// The decision produced for one signal.
///
/// Created once by the decision engine; the override pass may lower the
/// confidence and append to the reasoning afterwards, nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationDecision {
    pub remediation_type: RemediationType,
    /// Always within [0, 1]
    #[serde(default = "default_confidence")]
    pub confidence_score: f64,
    pub reasoning: String,
    /// Estimated effort in minutes, always > 0
    #[serde(default = "default_effort")]
    pub estimated_effort: u32,
    pub risk_if_delayed: RiskLevel,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

fn default_confidence() -> f64 {
    0.7
}

fn default_effort() -> u32 {
    60
}

impl RemediationDecision {
    pub fn new(
        remediation_type: RemediationType,
        confidence_score: f64,
        reasoning: impl Into<String>,
        risk_if_delayed: RiskLevel,
    ) -> Self {
        Self {
            remediation_type,
            confidence_score: confidence_score.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
            estimated_effort: default_effort(),
            risk_if_delayed,
            prerequisites: Vec::new(),
            recommended_actions: Vec::new(),
        }
    }

    pub fn with_estimated_effort(mut self, minutes: u32) -> Self {
        self.estimated_effort = minutes.max(1);
        self
    }

    pub fn with_prerequisites(mut self, prerequisites: Vec<String>) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    pub fn with_recommended_actions(mut self, actions: Vec<String>) -> Self {
        self.recommended_actions = actions;
        self
    }

    /// Whether this decision may proceed without any human sign-off.
    pub fn auto_approve(&self) -> bool {
        self.remediation_type == RemediationType::Automatic && self.confidence_score >= 0.9
    }

    /// Whether execution requires human approval at some point.
    pub fn requires_human_approval(&self) -> bool {
        self.remediation_type != RemediationType::Automatic
    }
}
