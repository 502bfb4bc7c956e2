//! Workflow and workflow-step types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::decision::RemediationType;
use super::signal::RiskLevel;

/// Lifecycle status of a single workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

/// The fixed enumeration of step kinds the dispatcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ApiCall,
    DatabaseOperation,
    EmailNotification,
    HumanApproval,
    HumanTask,
    HumanReview,
    QueueSetup,
    PrerequisiteValidation,
    CompletionVerification,
    Notification,
    ComplianceStatusUpdate,
    DataAnalysis,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiCall => "api_call",
            Self::DatabaseOperation => "database_operation",
            Self::EmailNotification => "email_notification",
            Self::HumanApproval => "human_approval",
            Self::HumanTask => "human_task",
            Self::HumanReview => "human_review",
            Self::QueueSetup => "queue_setup",
            Self::PrerequisiteValidation => "prerequisite_validation",
            Self::CompletionVerification => "completion_verification",
            Self::Notification => "notification",
            Self::ComplianceStatusUpdate => "compliance_status_update",
            Self::DataAnalysis => "data_analysis",
        }
    }
}

/// One unit of work within a workflow.
///
/// Created by the step generator; only the dispatcher changes `status`,
/// `error_message` and `retry_count` afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_step_duration")]
    pub estimated_duration_minutes: u32,
    pub order: u32,
}

fn default_max_retries() -> u32 {
    3
}

fn default_step_duration() -> u32 {
    5
}

impl WorkflowStep {
    pub fn new(name: impl Into<String>, action_type: ActionType, order: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            action_type,
            parameters: HashMap::new(),
            status: StepStatus::Pending,
            error_message: None,
            retry_count: 0,
            max_retries: default_max_retries(),
            estimated_duration_minutes: default_step_duration(),
            order,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration_minutes = minutes.max(1);
        self
    }
}

/// Overall workflow status, derived from the steps and the decision type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    RequiresHuman,
}

/// The ordered remediation plan for one violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationWorkflow {
    pub id: String,
    pub violation_id: String,
    pub activity_id: String,
    pub remediation_type: RemediationType,
    #[serde(default)]
    pub status: WorkflowStatus,
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub current_step_index: usize,
    pub priority: RiskLevel,
    /// Sum of the steps' estimated durations, in minutes
    pub total_estimated_duration: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RemediationWorkflow {
    pub fn new(
        violation_id: impl Into<String>,
        activity_id: impl Into<String>,
        remediation_type: RemediationType,
        priority: RiskLevel,
        steps: Vec<WorkflowStep>,
    ) -> Self {
        let total_estimated_duration = steps.iter().map(|s| s.estimated_duration_minutes).sum();
        Self {
            id: Uuid::new_v4().to_string(),
            violation_id: violation_id.into(),
            activity_id: activity_id.into(),
            remediation_type,
            status: WorkflowStatus::Pending,
            steps,
            current_step_index: 0,
            priority,
            total_estimated_duration,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count()
    }

    pub fn failed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .count()
    }

    /// First failure message among the steps, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .find_map(|s| s.error_message.as_deref())
    }
}
