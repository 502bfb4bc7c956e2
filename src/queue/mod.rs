//! Queue publisher boundary.
//!
//! Workflow hand-off messages go through `QueuePublisher`. The engine ships
//! an in-memory implementation; production deployments plug in a managed
//! queue client behind the same trait. Publishers report failure through
//! the result, never through an error.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::model::{RemediationType, RemediationWorkflow, RiskLevel};

/// Result of one publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl PublishResult {
    pub fn ok(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Seam for the managed message queue.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    async fn send(&self, queue: &str, payload: Value) -> PublishResult;
}

/// In-memory queue, used by default and in tests.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    messages: Mutex<HashMap<String, Vec<Value>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages published to the given queue so far.
    pub async fn messages_on(&self, queue: &str) -> Vec<Value> {
        self.messages
            .lock()
            .await
            .get(queue)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueuePublisher for InMemoryQueue {
    async fn send(&self, queue: &str, payload: Value) -> PublishResult {
        let mut guard = self.messages.lock().await;
        guard.entry(queue.to_string()).or_default().push(payload);
        PublishResult::ok(Uuid::new_v4().to_string())
    }
}

/// Publish the workflow start message to the queue matching its type and
/// priority. Undeliverable messages are parked on the dead-letter queue.
pub async fn send_workflow_message(
    publisher: &dyn QueuePublisher,
    queues: &QueueConfig,
    workflow: &RemediationWorkflow,
) -> PublishResult {
    let queue = match workflow.remediation_type {
        RemediationType::Automatic if workflow.priority >= RiskLevel::High => {
            &queues.high_priority_queue
        }
        RemediationType::Automatic => &queues.main_queue,
        RemediationType::HumanInLoop | RemediationType::ManualOnly => {
            &queues.human_intervention_queue
        }
    };

    let payload = serde_json::json!({
        "workflow_id": workflow.id,
        "violation_id": workflow.violation_id,
        "remediation_type": workflow.remediation_type,
        "priority": workflow.priority,
        "total_estimated_duration": workflow.total_estimated_duration,
        "timestamp": Utc::now(),
    });
    let result = publisher.send(queue, payload.clone()).await;
    if !result.success {
        // Best effort; the original failure is what the caller sees
        publisher.send(&queues.dead_letter_queue, payload).await;
    }
    result
}

/// Publish the downstream mode-routing message: automatic workflows route
/// as `auto`, everything else as `manual`, wrapping the original request.
pub async fn send_mode_routing_message(
    publisher: &dyn QueuePublisher,
    queues: &QueueConfig,
    remediation_type: RemediationType,
    data: Value,
) -> PublishResult {
    let mode = match remediation_type {
        RemediationType::Automatic => "auto",
        RemediationType::HumanInLoop | RemediationType::ManualOnly => "manual",
    };
    let payload = serde_json::json!({ "mode": mode, "data": data });
    publisher.send(&queues.main_queue, payload).await
}
