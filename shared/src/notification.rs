//! SSE 通知负载
//!
//! 服务端通过 `event: notification` 帧推送，客户端按原样反序列化。
//! `recipient` 为空表示广播给所有在线连接。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Order,
    Delivery,
    Promotion,
    System,
}

/// Payload pushed on the notification stream
///
/// 同一结构也作为 `notification` 文档持久化到每个用户的通知列表。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    /// Target user id; `None` means broadcast
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl NotificationPayload {
    /// 创建定向通知
    pub fn to_user(
        recipient: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            action_url: None,
            recipient: Some(recipient.into()),
        }
    }

    /// 创建广播通知
    pub fn broadcast(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            action_url: None,
            recipient: None,
        }
    }

    /// 附加跳转链接
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_has_no_recipient() {
        let n = NotificationPayload::broadcast(NotificationKind::System, "Maintenance", "Tonight");
        assert!(n.recipient.is_none());
        let json = serde_json::to_value(&n).unwrap();
        assert!(json.get("recipient").is_none());
        assert_eq!(json["kind"], "system");
    }

    #[test]
    fn test_targeted_notification() {
        let n = NotificationPayload::to_user("user:abc", NotificationKind::Order, "Delivered", "Enjoy")
            .with_action_url("/orders/1");
        assert_eq!(n.recipient.as_deref(), Some("user:abc"));
        assert_eq!(n.action_url.as_deref(), Some("/orders/1"));
    }
}
