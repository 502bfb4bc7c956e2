//! Pre-execution plan validation.
//!
//! Sanity checks over the (signal, decision, steps) triple before anything
//! runs. Errors make the plan invalid; warnings are advisory only.

use serde::{Deserialize, Serialize};

use crate::errors::WorkflowError;
use crate::model::{
    ActionType, RemediationDecision, RemediationSignal, RemediationType, RemediationWorkflow,
    RiskLevel,
};

/// Outcome of validating an assembled plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlanValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate a remediation plan before execution.
pub fn validate_plan(
    signal: &RemediationSignal,
    decision: &RemediationDecision,
    workflow: &RemediationWorkflow,
) -> PlanValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if workflow.steps.is_empty() {
        errors.push(
            WorkflowError::EmptyWorkflow {
                id: workflow.id.clone(),
            }
            .to_string(),
        );
    }

    if decision.confidence_score < 0.3 {
        errors.push(format!(
            "Decision confidence {:.2} too low to act on",
            decision.confidence_score
        ));
    }

    if signal.violation.risk_level == RiskLevel::Critical
        && decision.remediation_type == RemediationType::Automatic
    {
        errors.push("Critical-risk violations cannot be remediated automatically".to_string());
    }

    if workflow.remediation_type != decision.remediation_type {
        errors.push("Workflow type does not match the owning decision".to_string());
    }

    if decision.estimated_effort > 480 {
        warnings.push(format!(
            "Estimated effort of {} minutes exceeds one working day",
            decision.estimated_effort
        ));
    }

    // Destructive work scheduled before any verification gate is a smell
    let first_destructive = workflow
        .steps
        .iter()
        .filter(|s| s.action_type == ActionType::DatabaseOperation)
        .map(|s| s.order)
        .min();
    let first_verification = workflow
        .steps
        .iter()
        .filter(|s| {
            matches!(
                s.action_type,
                ActionType::PrerequisiteValidation | ActionType::HumanApproval
            )
        })
        .map(|s| s.order)
        .min();
    if let Some(destructive) = first_destructive {
        match first_verification {
            Some(verification) if verification < destructive => {}
            _ => warnings.push(
                "Destructive operation is not preceded by a verification or approval step"
                    .to_string(),
            ),
        }
    }

    PlanValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}
