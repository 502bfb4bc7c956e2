//! Human task coordination.
//!
//! Picks an intervention category from the decision type and complexity,
//! creates the task records, sends one notification per task (urgent tasks
//! get an extra alert) and schedules deadline reminders at urgency-specific
//! offsets, skipping reminders whose time has already passed.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{
    HumanTask, RemediationDecision, RemediationSignal, RemediationType, RemediationWorkflow,
    RiskLevel,
};
use crate::notify::{NotificationKind, NotificationTransport, reminder_times};

/// How much of the work humans take over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionCategory {
    FullManualExecution,
    ComplexReviewApproval,
    StandardReviewApproval,
    OversightOnly,
}

/// What the coordinator produced for one workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanLoopReport {
    pub category: InterventionCategory,
    pub tasks: Vec<HumanTask>,
    pub notifications_sent: usize,
    pub reminders_scheduled: usize,
}

/// Creates and announces human tasks for decisions that need people.
pub struct HumanTaskCoordinator {
    transport: Arc<dyn NotificationTransport>,
}

impl HumanTaskCoordinator {
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        Self { transport }
    }

    /// Category for the decision type, split by overall complexity.
    pub fn categorize(
        remediation_type: RemediationType,
        overall_complexity: f64,
    ) -> InterventionCategory {
        match remediation_type {
            RemediationType::ManualOnly => InterventionCategory::FullManualExecution,
            RemediationType::HumanInLoop => {
                if overall_complexity > 0.7 {
                    InterventionCategory::ComplexReviewApproval
                } else {
                    InterventionCategory::StandardReviewApproval
                }
            }
            RemediationType::Automatic => InterventionCategory::OversightOnly,
        }
    }

    /// Create the tasks, notify, and schedule reminders.
    pub async fn coordinate(
        &self,
        signal: &RemediationSignal,
        decision: &RemediationDecision,
        workflow: &RemediationWorkflow,
        overall_complexity: f64,
    ) -> HumanLoopReport {
        let category = Self::categorize(decision.remediation_type, overall_complexity);
        let now = Utc::now();
        let urgency = signal.urgency;
        let due = now + Duration::hours(urgency.due_hours());
        let assignee = self.select_assignee(signal);

        let mut tasks = Vec::new();

        match category {
            InterventionCategory::FullManualExecution => {
                let main = HumanTask::new(
                    workflow.id.clone(),
                    format!("Manual remediation: {}", signal.violation.id),
                    assignee.clone(),
                    urgency,
                    due,
                )
                .with_description(signal.violation.description.clone())
                .with_instructions(self.manual_instructions(signal, decision))
                .with_required_approvals(self.required_approvals(signal));
                let documentation = HumanTask::new(
                    workflow.id.clone(),
                    format!("Document remediation: {}", signal.violation.id),
                    assignee.clone(),
                    urgency,
                    due + Duration::hours(2),
                )
                .with_description("Record the manual remediation steps taken".to_string())
                .with_instructions(vec![
                    "Capture each action performed and its outcome".to_string(),
                    "Attach evidence for the compliance record".to_string(),
                ]);
                tasks.push(main);
                tasks.push(documentation);
            }
            InterventionCategory::ComplexReviewApproval
            | InterventionCategory::StandardReviewApproval => {
                let review_hours =
                    if category == InterventionCategory::ComplexReviewApproval { 24 } else { 8 };
                let review = HumanTask::new(
                    workflow.id.clone(),
                    format!("Review remediation plan: {}", signal.violation.id),
                    assignee.clone(),
                    urgency,
                    due,
                )
                .with_description(signal.violation.description.clone())
                .with_instructions(vec![
                    format!("Complete the plan review within {review_hours} hours"),
                    "Confirm the proposed steps match the violation scope".to_string(),
                    format!("Decision reasoning: {}", decision.reasoning),
                ])
                .with_required_approvals(self.required_approvals(signal));
                let review_due = review.due_date;
                tasks.push(review);

                if category == InterventionCategory::ComplexReviewApproval {
                    let approver = if signal.violation.risk_level == RiskLevel::Critical {
                        "dpo".to_string()
                    } else {
                        "compliance_manager".to_string()
                    };
                    tasks.push(
                        HumanTask::new(
                            workflow.id.clone(),
                            format!("Approve remediation: {}", signal.violation.id),
                            approver,
                            urgency,
                            review_due + Duration::hours(4),
                        )
                        .with_description(
                            "Sign off the reviewed remediation plan before execution".to_string(),
                        ),
                    );
                }
            }
            InterventionCategory::OversightOnly => {
                tasks.push(
                    HumanTask::new(
                        workflow.id.clone(),
                        format!("Monitor automatic remediation: {}", signal.violation.id),
                        assignee.clone(),
                        urgency,
                        now + Duration::hours(4),
                    )
                    .with_description(
                        "Spot-check the automated run and its completion report".to_string(),
                    ),
                );
            }
        }

        if signal.violation.risk_level >= RiskLevel::High {
            tasks.push(
                HumanTask::new(
                    workflow.id.clone(),
                    format!("Risk assessment: {}", signal.violation.id),
                    "risk_team".to_string(),
                    urgency,
                    now + Duration::hours(12),
                )
                .with_description("Assess residual risk while remediation is pending".to_string()),
            );
        }
        if signal.violation.risk_level == RiskLevel::Critical {
            tasks.push(
                HumanTask::new(
                    workflow.id.clone(),
                    format!("Notify stakeholders: {}", signal.violation.id),
                    "senior_compliance_officer".to_string(),
                    urgency,
                    now + Duration::hours(6),
                )
                .with_description(
                    "Brief leadership and affected stakeholders on the critical violation"
                        .to_string(),
                ),
            );
        }

        let mut notifications_sent = 0;
        let mut reminders_scheduled = 0;
        for task in &tasks {
            let kind = if task.title.starts_with("Approve") {
                NotificationKind::ApprovalNeeded
            } else {
                NotificationKind::HumanInterventionRequired
            };
            let context = HashMap::from([
                ("task_id".to_string(), json!(task.id)),
                ("task_title".to_string(), json!(task.title)),
                ("assignee".to_string(), json!(task.assignee)),
                ("due_date".to_string(), json!(task.due_date)),
            ]);
            let result = self.transport.send(kind, workflow, &context).await;
            if result.success {
                notifications_sent += 1;
            }

            if task.priority == RiskLevel::Critical {
                let urgent = self
                    .transport
                    .send(NotificationKind::UrgentAttention, workflow, &context)
                    .await;
                if urgent.success {
                    notifications_sent += 1;
                }
            }

            reminders_scheduled += reminder_times(task.priority, task.due_date, now).len();
        }

        HumanLoopReport {
            category,
            tasks,
            notifications_sent,
            reminders_scheduled,
        }
    }

    fn select_assignee(&self, signal: &RemediationSignal) -> String {
        let data_types: Vec<String> = signal
            .violation
            .data_types
            .iter()
            .map(|dt| dt.to_lowercase())
            .collect();

        if data_types
            .iter()
            .any(|dt| dt == "health" || dt == "biometric")
        {
            "data_privacy_specialist".to_string()
        } else if data_types.iter().any(|dt| dt == "financial") {
            "financial_compliance_specialist".to_string()
        } else if signal.violation.risk_level == RiskLevel::Critical {
            "senior_compliance_officer".to_string()
        } else {
            "compliance_team".to_string()
        }
    }

    fn required_approvals(&self, signal: &RemediationSignal) -> Vec<String> {
        let mut approvals = match signal.violation.risk_level {
            RiskLevel::Critical => vec![
                "dpo_approval".to_string(),
                "senior_management_approval".to_string(),
            ],
            RiskLevel::High => vec!["manager_approval".to_string()],
            _ => Vec::new(),
        };

        let sensitive = signal.violation.data_types.iter().any(|dt| {
            let dt = dt.to_lowercase();
            dt == "health" || dt == "biometric" || dt == "sensitive"
        });
        if sensitive {
            approvals.push("privacy_specialist_approval".to_string());
        }
        if signal.violation.cross_border_transfer {
            approvals.push("international_transfer_approval".to_string());
        }

        approvals
    }

    fn manual_instructions(
        &self,
        signal: &RemediationSignal,
        decision: &RemediationDecision,
    ) -> Vec<String> {
        let mut instructions = vec![
            format!("Remediate violation {} manually", signal.violation.id),
            format!("Framework: {}", signal.framework),
        ];
        for action in &signal.violation.remediation_actions {
            instructions.push(format!("Action: {action}"));
        }
        for prerequisite in &decision.prerequisites {
            instructions.push(format!("Prerequisite: {prerequisite}"));
        }
        instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionType, ProcessingActivity, Violation, WorkflowStep};
    use crate::notify::RecordingTransport;

    fn setup(risk: RiskLevel, remediation_type: RemediationType) -> (
        RemediationSignal,
        RemediationDecision,
        RemediationWorkflow,
    ) {
        let violation = Violation::new("v-1", "test violation", risk)
            .with_actions(vec!["Delete stale data".to_string()]);
        let signal = RemediationSignal::new(violation, ProcessingActivity::new("a-1", "x"));
        let decision = RemediationDecision::new(remediation_type, 0.8, "test", risk);
        let workflow = RemediationWorkflow::new(
            "v-1",
            "a-1",
            remediation_type,
            risk,
            vec![WorkflowStep::new("s", ActionType::HumanReview, 1)],
        );
        (signal, decision, workflow)
    }

    #[test]
    fn test_categorization() {
        assert_eq!(
            HumanTaskCoordinator::categorize(RemediationType::ManualOnly, 0.2),
            InterventionCategory::FullManualExecution
        );
        assert_eq!(
            HumanTaskCoordinator::categorize(RemediationType::HumanInLoop, 0.9),
            InterventionCategory::ComplexReviewApproval
        );
        assert_eq!(
            HumanTaskCoordinator::categorize(RemediationType::HumanInLoop, 0.5),
            InterventionCategory::StandardReviewApproval
        );
        assert_eq!(
            HumanTaskCoordinator::categorize(RemediationType::Automatic, 0.9),
            InterventionCategory::OversightOnly
        );
    }

    #[tokio::test]
    async fn test_manual_execution_creates_main_and_documentation_tasks() {
        let transport = Arc::new(RecordingTransport::new());
        let coordinator = HumanTaskCoordinator::new(transport.clone());
        let (signal, decision, workflow) = setup(RiskLevel::Medium, RemediationType::ManualOnly);

        let report = coordinator
            .coordinate(&signal, &decision, &workflow, 0.3)
            .await;
        assert_eq!(report.category, InterventionCategory::FullManualExecution);
        assert_eq!(report.tasks.len(), 2);
        assert!(report.tasks[0].title.starts_with("Manual remediation"));
        assert_eq!(
            report.tasks[1].due_date - report.tasks[0].due_date,
            Duration::hours(2)
        );
        assert_eq!(report.notifications_sent, 2);
    }

    #[tokio::test]
    async fn test_complex_review_gets_approval_task() {
        let transport = Arc::new(RecordingTransport::new());
        let coordinator = HumanTaskCoordinator::new(transport.clone());
        let (signal, decision, workflow) = setup(RiskLevel::Medium, RemediationType::HumanInLoop);

        let report = coordinator
            .coordinate(&signal, &decision, &workflow, 0.8)
            .await;
        assert_eq!(report.category, InterventionCategory::ComplexReviewApproval);
        assert_eq!(report.tasks.len(), 2);
        assert!(report.tasks[1].title.starts_with("Approve"));

        let sent = transport.sent().await;
        assert!(
            sent.iter()
                .any(|n| n.kind == NotificationKind::ApprovalNeeded)
        );
    }

    #[tokio::test]
    async fn test_standard_review_is_single_task() {
        let transport = Arc::new(RecordingTransport::new());
        let coordinator = HumanTaskCoordinator::new(transport);
        let (signal, decision, workflow) = setup(RiskLevel::Low, RemediationType::HumanInLoop);

        let report = coordinator
            .coordinate(&signal, &decision, &workflow, 0.4)
            .await;
        assert_eq!(report.category, InterventionCategory::StandardReviewApproval);
        assert_eq!(report.tasks.len(), 1);
        assert!(
            report.tasks[0]
                .instructions
                .iter()
                .any(|i| i.contains("8 hours"))
        );
    }

    #[tokio::test]
    async fn test_critical_risk_adds_assessment_and_stakeholder_tasks() {
        let transport = Arc::new(RecordingTransport::new());
        let coordinator = HumanTaskCoordinator::new(transport.clone());
        let (signal, decision, workflow) = setup(RiskLevel::Critical, RemediationType::ManualOnly);

        let report = coordinator
            .coordinate(&signal, &decision, &workflow, 0.5)
            .await;
        // main + documentation + risk assessment + stakeholder notification
        assert_eq!(report.tasks.len(), 4);
        assert!(report.tasks.iter().any(|t| t.title.starts_with("Risk")));
        assert!(
            report
                .tasks
                .iter()
                .any(|t| t.title.starts_with("Notify stakeholders"))
        );

        // One notification per task plus one urgent alert each at critical
        let sent = transport.sent().await;
        assert!(
            sent.iter()
                .filter(|n| n.kind == NotificationKind::UrgentAttention)
                .count()
                >= 1
        );
        assert_eq!(report.notifications_sent, sent.len());
    }

    #[tokio::test]
    async fn test_due_dates_follow_urgency() {
        let transport = Arc::new(RecordingTransport::new());
        let coordinator = HumanTaskCoordinator::new(transport);
        let (signal, decision, workflow) = setup(RiskLevel::High, RemediationType::HumanInLoop);

        let before = Utc::now();
        let report = coordinator
            .coordinate(&signal, &decision, &workflow, 0.4)
            .await;
        let review = &report.tasks[0];
        let expected = before + Duration::hours(24);
        let delta = (review.due_date - expected).num_minutes().abs();
        assert!(delta <= 1);
    }

    #[tokio::test]
    async fn test_reminders_scheduled_for_future_offsets() {
        let transport = Arc::new(RecordingTransport::new());
        let coordinator = HumanTaskCoordinator::new(transport);
        let (signal, decision, workflow) = setup(RiskLevel::Low, RemediationType::HumanInLoop);

        let report = coordinator
            .coordinate(&signal, &decision, &workflow, 0.4)
            .await;
        // Low urgency due in 72h: both the 72h-24h and 24h offsets minus the
        // one landing exactly at creation time; at minimum one must remain.
        assert!(report.reminders_scheduled >= 1);
    }

    #[tokio::test]
    async fn test_assignee_selection_by_data_type() {
        let transport = Arc::new(RecordingTransport::new());
        let coordinator = HumanTaskCoordinator::new(transport);

        let violation = Violation::new("v-2", "biometric leak", RiskLevel::High)
            .with_data_types(vec!["biometric".to_string()]);
        let signal = RemediationSignal::new(violation, ProcessingActivity::new("a-1", "x"));
        let decision =
            RemediationDecision::new(RemediationType::ManualOnly, 0.8, "t", RiskLevel::High);
        let workflow = RemediationWorkflow::new(
            "v-2",
            "a-1",
            RemediationType::ManualOnly,
            RiskLevel::High,
            vec![WorkflowStep::new("s", ActionType::HumanTask, 1)],
        );

        let report = coordinator
            .coordinate(&signal, &decision, &workflow, 0.5)
            .await;
        assert_eq!(report.tasks[0].assignee, "data_privacy_specialist");
        assert!(
            report.tasks[0]
                .required_approvals
                .contains(&"privacy_specialist_approval".to_string())
        );
    }
}
