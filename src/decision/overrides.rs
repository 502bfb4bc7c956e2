//! The override pass.
//!
//! Runs after either decision path and forcibly lowers the automation level
//! when risk, feasibility or complexity demand it. Each applied override
//! subtracts 0.1 confidence (floor 0.1) and appends its reason to the
//! decision's reasoning. The checks are an independent layer on top of the
//! fallback tree and are not deduplicated against it.

use crate::model::{RemediationDecision, RemediationSignal, RemediationType, RiskLevel};

/// Apply the override rules in place. Returns the reasons that fired.
pub fn apply_overrides(
    decision: &mut RemediationDecision,
    signal: &RemediationSignal,
    overall_complexity: f64,
    feasibility_score: f64,
) -> Vec<String> {
    let mut applied = Vec::new();

    let mentions_policy = signal
        .violation
        .remediation_actions
        .iter()
        .any(|action| action.to_lowercase().contains("policy"));
    if mentions_policy && decision.remediation_type != RemediationType::ManualOnly {
        decision.remediation_type = RemediationType::ManualOnly;
        applied.push("Policy changes must be carried out manually".to_string());
    }

    if signal.violation.risk_level == RiskLevel::Critical
        && decision.remediation_type == RemediationType::Automatic
    {
        decision.remediation_type = RemediationType::HumanInLoop;
        applied.push("Critical risk level rules out unattended automation".to_string());
    }

    if feasibility_score < 0.3 && decision.remediation_type != RemediationType::ManualOnly {
        decision.remediation_type = RemediationType::ManualOnly;
        applied.push(format!(
            "Feasibility {feasibility_score:.2} below automation threshold"
        ));
    }

    if overall_complexity > 0.8 && decision.remediation_type == RemediationType::Automatic {
        decision.remediation_type = RemediationType::HumanInLoop;
        applied.push(format!(
            "Complexity {overall_complexity:.2} requires human oversight"
        ));
    }

    if !applied.is_empty() {
        decision.confidence_score =
            (decision.confidence_score - 0.1 * applied.len() as f64).max(0.1);
        decision
            .reasoning
            .push_str(&format!(" Adjustments: {}", applied.join("; ")));
    }

    applied
}
