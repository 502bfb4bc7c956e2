//! Notification boundary.
//!
//! Notifications fan out over channels chosen by workflow priority:
//! critical → email + chat + sms, high → email + chat, medium → email,
//! low → in-app. The transport is a trait; the default implementation
//! records sends in memory, which is also what the tests inspect.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::model::{RemediationWorkflow, RiskLevel};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WorkflowStarted,
    HumanInterventionRequired,
    ApprovalNeeded,
    WorkflowCompleted,
    WorkflowFailed,
    UrgentAttention,
    StatusUpdate,
    DeadlineApproaching,
}

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Chat,
    Sms,
    InApp,
}

/// Channels used for the given priority.
pub fn channels_for(priority: RiskLevel) -> Vec<Channel> {
    match priority {
        RiskLevel::Critical => vec![Channel::Email, Channel::Chat, Channel::Sms],
        RiskLevel::High => vec![Channel::Email, Channel::Chat],
        RiskLevel::Medium => vec![Channel::Email],
        RiskLevel::Low => vec![Channel::InApp],
    }
}

/// Reminder offsets (hours before the due date) per urgency.
pub fn reminder_offsets(priority: RiskLevel) -> &'static [i64] {
    match priority {
        RiskLevel::Critical => &[4, 1],
        RiskLevel::High => &[24, 4, 1],
        RiskLevel::Medium => &[48, 24, 4],
        RiskLevel::Low => &[72, 24],
    }
}

/// Reminder times before a due date, skipping any already in the past.
pub fn reminder_times(
    priority: RiskLevel,
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    reminder_offsets(priority)
        .iter()
        .map(|hours| due_date - Duration::hours(*hours))
        .filter(|time| *time > now)
        .collect()
}

/// Result of one notification send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub channels_used: Vec<Channel>,
}

/// Seam for the email/chat/sms transports.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(
        &self,
        kind: NotificationKind,
        workflow: &RemediationWorkflow,
        context: &HashMap<String, Value>,
    ) -> NotificationResult;
}

/// A notification captured by the in-memory transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub kind: NotificationKind,
    pub workflow_id: String,
    pub channels: Vec<Channel>,
    pub context: HashMap<String, Value>,
}

/// Default transport: records every send, always succeeds.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send(
        &self,
        kind: NotificationKind,
        workflow: &RemediationWorkflow,
        context: &HashMap<String, Value>,
    ) -> NotificationResult {
        let channels = channels_for(workflow.priority);
        self.sent.lock().await.push(SentNotification {
            kind,
            workflow_id: workflow.id.clone(),
            channels: channels.clone(),
            context: context.clone(),
        });
        NotificationResult {
            success: true,
            channels_used: channels,
        }
    }
}

/// Transport used when notifications are disabled: reports success over no
/// channels and keeps nothing.
#[derive(Debug, Default)]
pub struct NullTransport;

#[async_trait]
impl NotificationTransport for NullTransport {
    async fn send(
        &self,
        _kind: NotificationKind,
        _workflow: &RemediationWorkflow,
        _context: &HashMap<String, Value>,
    ) -> NotificationResult {
        NotificationResult {
            success: true,
            channels_used: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionType, RemediationType, WorkflowStep};

    fn workflow(priority: RiskLevel) -> RemediationWorkflow {
        RemediationWorkflow::new(
            "v-1",
            "a-1",
            RemediationType::HumanInLoop,
            priority,
            vec![WorkflowStep::new("step", ActionType::HumanReview, 1)],
        )
    }

    #[test]
    fn test_channel_selection_by_priority() {
        assert_eq!(
            channels_for(RiskLevel::Critical),
            vec![Channel::Email, Channel::Chat, Channel::Sms]
        );
        assert_eq!(
            channels_for(RiskLevel::High),
            vec![Channel::Email, Channel::Chat]
        );
        assert_eq!(channels_for(RiskLevel::Medium), vec![Channel::Email]);
        assert_eq!(channels_for(RiskLevel::Low), vec![Channel::InApp]);
    }

    #[test]
    fn test_reminder_times_skip_past() {
        let now = Utc::now();
        // Due in 2 hours at high urgency: the 24h and 4h reminders are
        // already in the past, only the 1h reminder remains.
        let times = reminder_times(RiskLevel::High, now + Duration::hours(2), now);
        assert_eq!(times.len(), 1);
        assert!(times[0] > now);
    }

    #[test]
    fn test_reminder_times_all_future() {
        let now = Utc::now();
        let times = reminder_times(RiskLevel::Medium, now + Duration::hours(72), now);
        assert_eq!(times.len(), 3);
    }

    #[tokio::test]
    async fn test_recording_transport_captures_sends() {
        let transport = RecordingTransport::new();
        let wf = workflow(RiskLevel::Critical);
        let result = transport
            .send(NotificationKind::ApprovalNeeded, &wf, &HashMap::new())
            .await;
        assert!(result.success);
        assert_eq!(result.channels_used.len(), 3);

        let sent = transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::ApprovalNeeded);
        assert_eq!(sent[0].workflow_id, wf.id);
    }
}
