//! Deterministic rule-based decisions.
//!
//! Used whenever the advisory path fails (transport error, unparsable
//! response, invalid payload) or is disabled. The tree is evaluated top
//! down, first match wins:
//!
//! 1. critical risk, or any action mentioning "policy" → manual_only
//! 2. high risk, any "delete" action, or high cross-system impact → human_in_loop
//! 3. three or more actions, or medium cross-system impact → human_in_loop
//! 4. otherwise → automatic

use serde::{Deserialize, Serialize};

use crate::analysis::{ComplexityReport, FeasibilityReport};
use crate::model::{RemediationDecision, RemediationSignal, RemediationType, RiskLevel};

/// Rough blast radius of the remediation across systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossSystemImpact {
    Low,
    Medium,
    High,
}

/// Estimate cross-system impact from the signal's coordination factors.
pub fn cross_system_impact(signal: &RemediationSignal) -> CrossSystemImpact {
    let violation = &signal.violation;
    let mut factors = 0;
    if violation.cross_border_transfer {
        factors += 1;
    }
    if violation.automated_decision_making {
        factors += 1;
    }
    if violation.recipients.len() > 2 {
        factors += 1;
    }
    if violation.remediation_actions.len() > 3 {
        factors += 1;
    }

    match factors {
        0 => CrossSystemImpact::Low,
        1 | 2 => CrossSystemImpact::Medium,
        _ => CrossSystemImpact::High,
    }
}

/// Confidence contributions are computed on the 0-5 raw complexity scale
/// the thresholds were tuned for; the report carries [0, 1].
fn raw_complexity(complexity: &ComplexityReport) -> f64 {
    complexity.overall_complexity * 5.0
}

/// Build a decision from the rule tree alone.
pub fn rule_based_decision(
    signal: &RemediationSignal,
    complexity: &ComplexityReport,
    feasibility: &FeasibilityReport,
) -> RemediationDecision {
    let violation = &signal.violation;
    let actions = &violation.remediation_actions;
    let impact = cross_system_impact(signal);
    let mentions = |needle: &str| {
        actions
            .iter()
            .any(|action| action.to_lowercase().contains(needle))
    };

    let (remediation_type, reasoning) = if violation.risk_level == RiskLevel::Critical
        || mentions("policy")
    {
        (
            RemediationType::ManualOnly,
            "Critical risk or policy change requires manual handling".to_string(),
        )
    } else if violation.risk_level == RiskLevel::High
        || mentions("delete")
        || impact == CrossSystemImpact::High
    {
        (
            RemediationType::HumanInLoop,
            "High risk, destructive action or broad system impact requires human oversight"
                .to_string(),
        )
    } else if actions.len() >= 3 || impact == CrossSystemImpact::Medium {
        (
            RemediationType::HumanInLoop,
            "Multi-step remediation or cross-system coordination requires human oversight"
                .to_string(),
        )
    } else {
        (
            RemediationType::Automatic,
            "Low risk and contained scope are suitable for automation".to_string(),
        )
    };

    let raw = raw_complexity(complexity);
    let base = if violation.risk_level <= RiskLevel::Medium {
        0.75
    } else {
        0.6
    };
    let confidence = (base + 0.05 * feasibility.automation_pattern_hits as f64
        - 0.06 * (raw - 2.0).max(0.0))
        .clamp(0.2, 0.95);

    let effort_minutes = (20.0 * actions.len().max(1) as f64 * (1.0 + raw / 4.0)).round() as u32;

    let mut prerequisites = type_prerequisites(remediation_type);
    for prereq in &feasibility.prerequisites {
        if !prerequisites.iter().any(|existing| existing == prereq) {
            prerequisites.push(prereq.clone());
        }
    }

    RemediationDecision::new(remediation_type, confidence, reasoning, violation.risk_level)
        .with_estimated_effort(effort_minutes)
        .with_prerequisites(prerequisites)
        .with_recommended_actions(feasibility.recommended_adjustments.clone())
}

/// Conservative decision when no analysis is available at all.
pub fn conservative_decision(signal: &RemediationSignal) -> RemediationDecision {
    RemediationDecision::new(
        RemediationType::HumanInLoop,
        0.3,
        "Analysis failed, defaulting to human oversight for safety",
        signal.violation.risk_level,
    )
    .with_estimated_effort(180)
    .with_prerequisites(vec![
        "Manual analysis required".to_string(),
        "System check needed".to_string(),
    ])
}

fn type_prerequisites(remediation_type: RemediationType) -> Vec<String> {
    match remediation_type {
        RemediationType::ManualOnly => vec![
            "Legal review required".to_string(),
            "Compliance officer approval".to_string(),
            "Impact assessment".to_string(),
        ],
        RemediationType::HumanInLoop => vec![
            "Human review and approval".to_string(),
            "Backup and recovery plan".to_string(),
        ],
        RemediationType::Automatic => Vec::new(),
    }
}
