//! Workflow step generation.
//!
//! Each free-text remediation action becomes one typed step via an ordered
//! keyword table (first match wins). Decision-type boilerplate steps are
//! appended afterwards, and a human-approval step is prepended when the
//! decision requires one and no action produced it. Orders are renumbered
//! sequentially at the end.

use serde_json::json;

use crate::model::{
    ActionType, RemediationDecision, RemediationSignal, RemediationType, RemediationWorkflow,
    WorkflowStep,
};

/// Placeholder when a violation arrives without proposed actions.
const DEFAULT_ACTION: &str = "Review compliance violation and determine remediation steps";

/// Ordered (keywords, category) classification table. Rows are evaluated
/// top down; the notification row downgrades to a human task for
/// manual-only decisions, the catch-all depends on the decision type.
const ACTION_KEYWORDS: &[(&[&str], ActionType)] = &[
    (&["approval", "authorize"], ActionType::HumanApproval),
    (
        &["delete", "remove", "purge", "erase"],
        ActionType::DatabaseOperation,
    ),
    (
        &["email", "notify", "message", "inform"],
        ActionType::EmailNotification,
    ),
    (
        &["review", "policy", "legal", "audit", "consent"],
        ActionType::HumanTask,
    ),
    (&["stop", "halt"], ActionType::ApiCall),
];

/// Base duration in minutes per action type.
fn base_duration(action_type: ActionType) -> u32 {
    match action_type {
        ActionType::ApiCall => 5,
        ActionType::DatabaseOperation => 15,
        ActionType::EmailNotification => 5,
        ActionType::HumanApproval => 30,
        ActionType::HumanTask => 60,
        ActionType::HumanReview => 45,
        ActionType::QueueSetup => 5,
        ActionType::PrerequisiteValidation => 5,
        ActionType::CompletionVerification => 10,
        ActionType::Notification => 5,
        ActionType::ComplianceStatusUpdate => 5,
        ActionType::DataAnalysis => 10,
    }
}

/// Builds the remediation plan for one signal + decision pair.
#[derive(Debug, Clone, Default)]
pub struct WorkflowStepGenerator;

impl WorkflowStepGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate the full workflow: per-action steps, boilerplate, mandatory
    /// approval, sequential ordering.
    pub fn generate(
        &self,
        signal: &RemediationSignal,
        decision: &RemediationDecision,
    ) -> RemediationWorkflow {
        let actions = if signal.violation.remediation_actions.is_empty() {
            vec![DEFAULT_ACTION.to_string()]
        } else {
            signal.violation.remediation_actions.clone()
        };

        let mut steps: Vec<WorkflowStep> = actions
            .iter()
            .map(|action| self.action_step(action, signal, decision))
            .collect();

        steps.extend(self.boilerplate_steps(decision.remediation_type));

        if decision.requires_human_approval()
            && !steps
                .iter()
                .any(|s| s.action_type == ActionType::HumanApproval)
        {
            steps.insert(
                0,
                WorkflowStep::new("Obtain Remediation Approval", ActionType::HumanApproval, 0)
                    .with_description("Approve the remediation plan before any action runs")
                    .with_parameter("assignee", json!("compliance_team"))
                    .with_duration(base_duration(ActionType::HumanApproval)),
            );
        }

        for (index, step) in steps.iter_mut().enumerate() {
            step.order = index as u32 + 1;
        }

        RemediationWorkflow::new(
            signal.violation.id.clone(),
            signal.activity.id.clone(),
            decision.remediation_type,
            signal.violation.risk_level,
            steps,
        )
    }

    fn classify(&self, action: &str, remediation_type: RemediationType) -> ActionType {
        let lower = action.to_lowercase();

        for (keywords, action_type) in ACTION_KEYWORDS {
            if keywords.iter().any(|kw| lower.contains(kw)) {
                // Outbound messaging is itself a human job in manual-only plans
                if *action_type == ActionType::EmailNotification
                    && remediation_type == RemediationType::ManualOnly
                {
                    return ActionType::HumanTask;
                }
                return *action_type;
            }
        }

        match remediation_type {
            RemediationType::Automatic => ActionType::ApiCall,
            _ => ActionType::HumanTask,
        }
    }

    fn action_step(
        &self,
        action: &str,
        signal: &RemediationSignal,
        decision: &RemediationDecision,
    ) -> WorkflowStep {
        let action_type = self.classify(action, decision.remediation_type);
        let name = if action.chars().count() > 50 {
            let prefix: String = action.chars().take(50).collect();
            format!("Execute: {prefix}...")
        } else {
            format!("Execute: {action}")
        };

        let mut step = WorkflowStep::new(name, action_type, 0)
            .with_description(format!("Execute remediation action: {action}"))
            .with_parameter("action_text", json!(action))
            .with_parameter(
                "automated",
                json!(decision.remediation_type == RemediationType::Automatic),
            )
            .with_parameter(
                "requires_approval",
                json!(decision.remediation_type == RemediationType::HumanInLoop),
            )
            .with_parameter("data_types", json!(signal.violation.data_types))
            .with_parameter("cross_border", json!(signal.violation.cross_border_transfer));

        step = self.type_parameters(step, action, action_type);
        step.with_duration(self.estimate_duration(action, action_type))
    }

    fn type_parameters(
        &self,
        step: WorkflowStep,
        action: &str,
        action_type: ActionType,
    ) -> WorkflowStep {
        let lower = action.to_lowercase();
        match action_type {
            ActionType::DatabaseOperation => {
                let destructive = ["delete", "purge", "erase"]
                    .iter()
                    .any(|verb| lower.contains(verb));
                let query = if destructive {
                    "DELETE FROM {table} WHERE subject_id = :subject_id"
                } else {
                    "UPDATE {table} SET {column} = :value WHERE subject_id = :subject_id"
                };
                step.with_parameter("query_template", json!(query))
                    .with_parameter("backup_required", json!(destructive))
            }
            ActionType::ApiCall => step
                .with_parameter("endpoint", json!("{remediation_api}/actions"))
                .with_parameter("method", json!("POST")),
            ActionType::EmailNotification => step
                .with_parameter("template", json!("remediation_notice"))
                .with_parameter("recipients_source", json!("affected_subjects")),
            ActionType::HumanApproval | ActionType::HumanTask | ActionType::HumanReview => {
                step.with_parameter("assignee", json!("compliance_team"))
            }
            _ => step,
        }
    }

    fn estimate_duration(&self, action: &str, action_type: ActionType) -> u32 {
        let mut minutes = base_duration(action_type);
        if action.len() > 80 {
            minutes += 5;
        }
        if action_type == ActionType::DatabaseOperation && action.to_lowercase().contains("backup")
        {
            minutes += 10;
        }
        minutes
    }

    fn boilerplate_steps(&self, remediation_type: RemediationType) -> Vec<WorkflowStep> {
        let templates: &[(&str, &str, ActionType)] = match remediation_type {
            RemediationType::Automatic => &[
                (
                    "Set Up Remediation Queues",
                    "Publish the workflow hand-off to the remediation queues",
                    ActionType::QueueSetup,
                ),
                (
                    "Data Analysis",
                    "Analyze data to understand the scope of remediation",
                    ActionType::DataAnalysis,
                ),
                (
                    "Validate Prerequisites",
                    "Validate all prerequisites are met",
                    ActionType::PrerequisiteValidation,
                ),
                (
                    "Verify Completion",
                    "Verify remediation was completed successfully",
                    ActionType::CompletionVerification,
                ),
                (
                    "Update Compliance Status",
                    "Update the compliance system with the resolution",
                    ActionType::ComplianceStatusUpdate,
                ),
            ],
            RemediationType::HumanInLoop => &[
                (
                    "Set Up Remediation Queues",
                    "Publish the workflow hand-off to the remediation queues",
                    ActionType::QueueSetup,
                ),
                (
                    "Human Review",
                    "Human review of the remediation plan",
                    ActionType::HumanReview,
                ),
                (
                    "Verify Completion",
                    "Human verification of remediation completion",
                    ActionType::CompletionVerification,
                ),
                (
                    "Send Notifications",
                    "Notify stakeholders of completion",
                    ActionType::Notification,
                ),
                (
                    "Update Compliance Status",
                    "Update the compliance system with the resolution",
                    ActionType::ComplianceStatusUpdate,
                ),
            ],
            RemediationType::ManualOnly => &[
                (
                    "Set Up Remediation Queues",
                    "Publish the workflow hand-off to the remediation queues",
                    ActionType::QueueSetup,
                ),
                (
                    "Initial Coordination",
                    "Coordinate assignees and hand over the manual remediation plan",
                    ActionType::HumanTask,
                ),
                (
                    "Send Notifications",
                    "Notify assigned personnel",
                    ActionType::Notification,
                ),
                (
                    "Update Compliance Status",
                    "Update the compliance system with the resolution",
                    ActionType::ComplianceStatusUpdate,
                ),
            ],
        };

        templates
            .iter()
            .map(|(name, description, action_type)| {
                WorkflowStep::new(*name, *action_type, 0)
                    .with_description(*description)
                    .with_duration(base_duration(*action_type))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProcessingActivity, RiskLevel, Violation};

    fn signal(actions: Vec<&str>) -> RemediationSignal {
        let violation = Violation::new("v-1", "test violation", RiskLevel::Medium)
            .with_actions(actions.into_iter().map(String::from).collect());
        RemediationSignal::new(violation, ProcessingActivity::new("a-1", "activity"))
    }

    fn decision(remediation_type: RemediationType) -> RemediationDecision {
        RemediationDecision::new(remediation_type, 0.8, "test", RiskLevel::Medium)
    }

    #[test]
    fn test_step_count_at_least_action_count() {
        let generator = WorkflowStepGenerator::new();
        let sig = signal(vec!["Delete records", "Notify users", "Audit access logs"]);
        let workflow = generator.generate(&sig, &decision(RemediationType::Automatic));
        assert!(workflow.step_count() >= 3);
    }

    #[test]
    fn test_delete_action_becomes_database_operation() {
        let generator = WorkflowStepGenerator::new();
        let workflow = generator.generate(
            &signal(vec!["Purge expired records"]),
            &decision(RemediationType::Automatic),
        );
        let step = &workflow.steps[0];
        assert_eq!(step.action_type, ActionType::DatabaseOperation);
        assert_eq!(step.parameters["backup_required"], json!(true));
        assert!(
            step.parameters["query_template"]
                .as_str()
                .unwrap()
                .starts_with("DELETE")
        );
    }

    #[test]
    fn test_notify_action_is_human_task_for_manual_only() {
        let generator = WorkflowStepGenerator::new();
        let sig = signal(vec!["Notify affected users"]);

        let auto = generator.generate(&sig, &decision(RemediationType::Automatic));
        assert_eq!(auto.steps[0].action_type, ActionType::EmailNotification);

        let manual = generator.generate(&sig, &decision(RemediationType::ManualOnly));
        // Approval step is prepended; the action step sits behind it
        let action_step = manual
            .steps
            .iter()
            .find(|s| s.description.contains("Notify affected users"))
            .unwrap();
        assert_eq!(action_step.action_type, ActionType::HumanTask);
    }

    #[test]
    fn test_human_in_loop_gets_single_prepended_approval() {
        let generator = WorkflowStepGenerator::new();
        let workflow = generator.generate(
            &signal(vec!["Update retention settings"]),
            &decision(RemediationType::HumanInLoop),
        );

        let approvals: Vec<_> = workflow
            .steps
            .iter()
            .filter(|s| s.action_type == ActionType::HumanApproval)
            .collect();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].order, 1);
        assert_eq!(workflow.steps[0].action_type, ActionType::HumanApproval);
    }

    #[test]
    fn test_explicit_approval_action_is_not_duplicated() {
        let generator = WorkflowStepGenerator::new();
        let workflow = generator.generate(
            &signal(vec!["Authorize deletion of archived data"]),
            &decision(RemediationType::HumanInLoop),
        );
        let approvals = workflow
            .steps
            .iter()
            .filter(|s| s.action_type == ActionType::HumanApproval)
            .count();
        assert_eq!(approvals, 1);
    }

    #[test]
    fn test_automatic_decision_adds_no_approval() {
        let generator = WorkflowStepGenerator::new();
        let workflow = generator.generate(
            &signal(vec!["Update retention settings"]),
            &decision(RemediationType::Automatic),
        );
        assert!(
            workflow
                .steps
                .iter()
                .all(|s| s.action_type != ActionType::HumanApproval)
        );
    }

    #[test]
    fn test_every_decision_type_gets_a_queue_setup_step() {
        let generator = WorkflowStepGenerator::new();
        for remediation_type in [
            RemediationType::Automatic,
            RemediationType::HumanInLoop,
            RemediationType::ManualOnly,
        ] {
            let workflow = generator.generate(
                &signal(vec!["Update retention settings"]),
                &decision(remediation_type),
            );
            let queue_steps = workflow
                .steps
                .iter()
                .filter(|s| s.action_type == ActionType::QueueSetup)
                .count();
            assert_eq!(queue_steps, 1, "{remediation_type:?}");
        }
    }

    #[test]
    fn test_empty_action_list_gets_placeholder() {
        let generator = WorkflowStepGenerator::new();
        let workflow = generator.generate(&signal(vec![]), &decision(RemediationType::Automatic));
        assert!(workflow.step_count() >= 1);
        assert!(workflow.steps[0].description.contains(DEFAULT_ACTION));
    }

    #[test]
    fn test_orders_are_sequential_from_one() {
        let generator = WorkflowStepGenerator::new();
        let workflow = generator.generate(
            &signal(vec!["Delete records", "Notify users"]),
            &decision(RemediationType::HumanInLoop),
        );
        let orders: Vec<u32> = workflow.steps.iter().map(|s| s.order).collect();
        let expected: Vec<u32> = (1..=workflow.steps.len() as u32).collect();
        assert_eq!(orders, expected);
    }

    #[test]
    fn test_total_duration_is_sum_of_steps() {
        let generator = WorkflowStepGenerator::new();
        let workflow = generator.generate(
            &signal(vec!["Delete records with backup verification"]),
            &decision(RemediationType::Automatic),
        );
        let sum: u32 = workflow
            .steps
            .iter()
            .map(|s| s.estimated_duration_minutes)
            .sum();
        assert_eq!(workflow.total_estimated_duration, sum);
    }

    #[test]
    fn test_backup_keyword_extends_database_duration() {
        let generator = WorkflowStepGenerator::new();
        let plain = generator.generate(
            &signal(vec!["Delete records"]),
            &decision(RemediationType::Automatic),
        );
        let with_backup = generator.generate(
            &signal(vec!["Delete records after backup"]),
            &decision(RemediationType::Automatic),
        );
        assert!(
            with_backup.steps[0].estimated_duration_minutes
                > plain.steps[0].estimated_duration_minutes
        );
    }

    #[test]
    fn test_stop_action_is_api_call() {
        let generator = WorkflowStepGenerator::new();
        let workflow = generator.generate(
            &signal(vec!["Halt automated profiling"]),
            &decision(RemediationType::HumanInLoop),
        );
        let action_step = workflow
            .steps
            .iter()
            .find(|s| s.description.contains("Halt automated profiling"))
            .unwrap();
        assert_eq!(action_step.action_type, ActionType::ApiCall);
    }
}
