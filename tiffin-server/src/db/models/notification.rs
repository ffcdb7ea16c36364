//! Notification Model
//!
//! 持久化的通知记录；实时推送使用 `shared::NotificationPayload`，
//! 两者字段一一对应。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::{NotificationKind, NotificationPayload};
use surrealdb::RecordId;

/// Persisted notification document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDoc {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Fan-out payload id, kept for client-side dedup
    pub payload_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    /// Target user id; `None` for broadcasts
    pub recipient: Option<String>,
    pub created_at: String,
}

impl From<&NotificationPayload> for NotificationDoc {
    fn from(payload: &NotificationPayload) -> Self {
        Self {
            id: None,
            payload_id: payload.id.clone(),
            kind: payload.kind,
            title: payload.title.clone(),
            message: payload.message.clone(),
            action_url: payload.action_url.clone(),
            recipient: payload.recipient.clone(),
            created_at: payload.timestamp.to_rfc3339(),
        }
    }
}
