//! Run state and final summary.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::analysis::{ComplexityReport, FeasibilityReport};
use crate::human::HumanLoopReport;
use crate::model::{
    HumanTask, MetricsSnapshot, RemediationDecision, RemediationSignal, RemediationWorkflow,
    TaskStatus,
};
use crate::workflow::{ExecutionReport, PlanValidation};

/// Terminal status of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    RequiresHuman,
    Failed,
}

/// Everything one run accumulates on its way through the stages.
///
/// Errors and execution-path markers are append-only; stages never erase
/// what an earlier stage recorded.
#[derive(Debug, Clone)]
pub struct OrchestrationState {
    pub signal: RemediationSignal,
    pub complexity: Option<ComplexityReport>,
    pub feasibility: Option<FeasibilityReport>,
    pub decision: Option<RemediationDecision>,
    pub workflow: Option<RemediationWorkflow>,
    pub validation: Option<PlanValidation>,
    pub execution: Option<ExecutionReport>,
    pub human_loop: Option<HumanLoopReport>,
    pub errors: Vec<String>,
    pub execution_path: Vec<String>,
    pub retry_count: u32,
    pub context: HashMap<String, Value>,
}

impl OrchestrationState {
    pub fn new(signal: RemediationSignal) -> Self {
        Self {
            signal,
            complexity: None,
            feasibility: None,
            decision: None,
            workflow: None,
            validation: None,
            execution: None,
            human_loop: None,
            errors: Vec::new(),
            execution_path: Vec::new(),
            retry_count: 0,
            context: HashMap::new(),
        }
    }

    /// Append a stage marker, e.g. "decide_completed".
    pub fn mark(&mut self, marker: impl Into<String>) {
        self.execution_path.push(marker.into());
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// An error that should abort the run before execution.
    pub fn has_blocking_error(&self) -> bool {
        self.errors
            .iter()
            .any(|e| {
                let e = e.to_lowercase();
                e.contains("critical") || e.contains("blocking")
            })
    }

    pub fn pending_human_tasks(&self) -> Vec<&HumanTask> {
        self.human_loop
            .as_ref()
            .map(|report| {
                report
                    .tasks
                    .iter()
                    .filter(|t| t.status != TaskStatus::Completed)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Derive the terminal status from what the run accumulated.
    pub fn derive_status(&self) -> RunStatus {
        if !self.errors.is_empty() {
            RunStatus::Failed
        } else if !self.pending_human_tasks().is_empty() {
            RunStatus::RequiresHuman
        } else {
            RunStatus::Completed
        }
    }
}

/// The serializable result handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub success: bool,
    pub status: RunStatus,
    pub violation_id: String,
    pub signal_summary: String,
    pub execution_path: Vec<String>,
    pub errors: Vec<String>,
    pub complexity: Option<ComplexityReport>,
    pub feasibility: Option<FeasibilityReport>,
    pub decision: Option<RemediationDecision>,
    pub workflow: Option<RemediationWorkflow>,
    pub validation: Option<PlanValidation>,
    pub execution: Option<ExecutionReport>,
    pub human_loop: Option<HumanLoopReport>,
    pub next_steps: Vec<String>,
    pub metrics: MetricsSnapshot,
}

impl ExecutionSummary {
    /// Assemble the summary from a finished run state.
    pub fn from_state(state: OrchestrationState, metrics: MetricsSnapshot) -> Self {
        let status = state.derive_status();
        let next_steps = next_steps(&state, status);
        Self {
            success: status != RunStatus::Failed,
            status,
            violation_id: state.signal.violation.id.clone(),
            signal_summary: state.signal.summary(),
            execution_path: state.execution_path,
            errors: state.errors,
            complexity: state.complexity,
            feasibility: state.feasibility,
            decision: state.decision,
            workflow: state.workflow,
            validation: state.validation,
            execution: state.execution,
            human_loop: state.human_loop,
            next_steps,
            metrics,
        }
    }
}

fn next_steps(state: &OrchestrationState, status: RunStatus) -> Vec<String> {
    match status {
        RunStatus::Failed => {
            let mut steps = vec!["Investigate the recorded errors before retrying".to_string()];
            if let Some(error) = state.errors.first() {
                steps.push(format!("First error: {error}"));
            }
            steps
        }
        RunStatus::RequiresHuman => {
            let now = Utc::now();
            state
                .pending_human_tasks()
                .iter()
                .map(|task| {
                    if task.is_overdue(now) {
                        format!(
                            "Complete task '{}' (assignee: {}, overdue)",
                            task.title, task.assignee
                        )
                    } else {
                        format!(
                            "Complete task '{}' (assignee: {})",
                            task.title, task.assignee
                        )
                    }
                })
                .collect()
        }
        RunStatus::Completed => vec![
            "Archive the remediation record".to_string(),
            "Verify compliance status in the next audit cycle".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProcessingActivity, RiskLevel, Violation};

    fn state() -> OrchestrationState {
        OrchestrationState::new(RemediationSignal::new(
            Violation::new("v-1", "test", RiskLevel::Medium),
            ProcessingActivity::new("a-1", "activity"),
        ))
    }

    #[test]
    fn test_markers_are_append_only() {
        let mut s = state();
        s.mark("analyze_started");
        s.mark("analyze_completed");
        assert_eq!(
            s.execution_path,
            vec!["analyze_started", "analyze_completed"]
        );
    }

    #[test]
    fn test_blocking_error_detection() {
        let mut s = state();
        assert!(!s.has_blocking_error());
        s.record_error("plan rejected: critical risk cannot run automatically");
        assert!(s.has_blocking_error());
    }

    #[test]
    fn test_status_derivation_prefers_failure() {
        let mut s = state();
        s.record_error("something broke");
        assert_eq!(s.derive_status(), RunStatus::Failed);
    }

    #[test]
    fn test_clean_state_is_completed() {
        assert_eq!(state().derive_status(), RunStatus::Completed);
    }

    #[test]
    fn test_overdue_pending_task_is_flagged_in_next_steps() {
        use crate::human::{HumanLoopReport, InterventionCategory};
        use chrono::Duration;

        let mut s = state();
        let task = HumanTask::new(
            "wf-1",
            "Approve remediation plan",
            "dpo",
            RiskLevel::High,
            Utc::now() - Duration::hours(2),
        );
        s.human_loop = Some(HumanLoopReport {
            category: InterventionCategory::StandardReviewApproval,
            tasks: vec![task],
            notifications_sent: 1,
            reminders_scheduled: 0,
        });

        let summary = ExecutionSummary::from_state(s, MetricsSnapshot::default());
        assert_eq!(summary.status, RunStatus::RequiresHuman);
        assert!(summary.next_steps[0].contains("overdue"));
    }

    #[test]
    fn test_failed_summary_lists_first_error() {
        let mut s = state();
        s.record_error("advisory transport unreachable");
        let summary = ExecutionSummary::from_state(s, MetricsSnapshot::default());
        assert!(!summary.success);
        assert_eq!(summary.status, RunStatus::Failed);
        assert!(summary.next_steps.iter().any(|n| n.contains("advisory")));
    }
}
