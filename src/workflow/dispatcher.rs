//! Sequential step execution.
//!
//! The dispatcher walks the workflow's steps in order, looks each action
//! type up in a handler table and runs the handler. Handlers report
//! ordinary failure through `StepResult`, not through errors; an unmapped
//! action type is itself a failure result. The first failure halts the
//! walk, later steps stay pending and are never executed.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::WorkflowError;
use crate::model::{
    ActionType, RemediationWorkflow, StepStatus, WorkflowStatus, WorkflowStep,
};

/// Outcome of one handler invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StepResult {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    #[serde(default)]
    pub details: HashMap<String, Value>,
}

impl StepResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            details: HashMap::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// One step executor. Implementations return a failure result for ordinary
/// failure conditions; only truly unexpected errors should panic, and the
/// dispatcher never relies on that.
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn execute(&self, step: &WorkflowStep, workflow: &RemediationWorkflow) -> StepResult;
}

/// Summary of one dispatch run over a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub workflow_id: String,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub failed_steps: usize,
    pub success_rate: f64,
    pub overall_status: WorkflowStatus,
    pub first_error: Option<String>,
}

/// Runs workflows through a fixed action-type → handler table.
pub struct StepExecutionDispatcher {
    handlers: HashMap<ActionType, Arc<dyn StepHandler>>,
}

impl StepExecutionDispatcher {
    /// Dispatcher with an explicit handler table.
    pub fn with_handlers(handlers: HashMap<ActionType, Arc<dyn StepHandler>>) -> Self {
        Self { handlers }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Execute the workflow's steps in order, halting on the first failure.
    /// The workflow's status, step statuses and timestamps are updated in
    /// place; the report summarizes the run.
    pub async fn execute_workflow(&self, workflow: &mut RemediationWorkflow) -> ExecutionReport {
        workflow.status = WorkflowStatus::InProgress;
        workflow.started_at = Some(Utc::now());
        workflow.steps.sort_by_key(|s| s.order);

        let mut first_error = None;

        for index in 0..workflow.steps.len() {
            workflow.current_step_index = index;
            workflow.steps[index].status = StepStatus::InProgress;

            let step_snapshot = workflow.steps[index].clone();
            let result = match self.handlers.get(&step_snapshot.action_type) {
                Some(handler) => handler.execute(&step_snapshot, workflow).await,
                None => StepResult::failed(
                    WorkflowError::UnsupportedActionType {
                        action_type: step_snapshot.action_type.as_str().to_string(),
                    }
                    .to_string(),
                ),
            };

            let step = &mut workflow.steps[index];
            if result.success {
                step.status = StepStatus::Completed;
            } else {
                let error = result
                    .error
                    .unwrap_or_else(|| "Step failed without error message".to_string());
                step.status = StepStatus::Failed;
                step.error_message = Some(error.clone());
                first_error = Some(error);
                break;
            }
        }

        let total_steps = workflow.steps.len();
        let completed_steps = workflow.completed_steps();
        let failed_steps = workflow.failed_steps();

        workflow.status = if failed_steps > 0 {
            WorkflowStatus::Failed
        } else {
            // Empty workflows are trivially complete
            WorkflowStatus::Completed
        };
        if workflow.status == WorkflowStatus::Completed {
            workflow.completed_at = Some(Utc::now());
        }

        let success_rate = if total_steps == 0 {
            1.0
        } else {
            completed_steps as f64 / total_steps as f64
        };

        ExecutionReport {
            workflow_id: workflow.id.clone(),
            total_steps,
            completed_steps,
            failed_steps,
            success_rate,
            overall_status: workflow.status,
            first_error,
        }
    }
}
