//! Human task records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::signal::RiskLevel;

/// Lifecycle status of a human task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// A tracked unit of work assigned to a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanTask {
    pub id: String,
    pub workflow_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assignee: String,
    pub priority: RiskLevel,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub required_approvals: Vec<String>,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl HumanTask {
    pub fn new(
        workflow_id: impl Into<String>,
        title: impl Into<String>,
        assignee: impl Into<String>,
        priority: RiskLevel,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            title: title.into(),
            description: String::new(),
            assignee: assignee.into(),
            priority,
            status: TaskStatus::Pending,
            instructions: Vec::new(),
            required_approvals: Vec::new(),
            due_date,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instructions(mut self, instructions: Vec<String>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn with_required_approvals(mut self, approvals: Vec<String>) -> Self {
        self.required_approvals = approvals;
        self
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && now > self.due_date
    }
}
