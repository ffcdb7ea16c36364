//! 连接注册表
//!
//! DashMap 保存所有在线 SSE 连接。广播是同步的 fire-and-forget：
//! 逐个匹配收件人并尝试发送，发送失败（对端已断开）跳过，由连接
//! 自己的 Drop 负责注销。

use dashmap::DashMap;
use shared::NotificationPayload;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One live SSE connection
#[derive(Debug)]
struct Subscriber {
    tx: mpsc::UnboundedSender<NotificationPayload>,
    /// None 表示未按用户过滤（只收广播通知）
    user_id: Option<String>,
}

impl Subscriber {
    /// 该连接是否应收到这条通知
    fn wants(&self, payload: &NotificationPayload) -> bool {
        match (&payload.recipient, &self.user_id) {
            // 广播通知所有连接都收
            (None, _) => true,
            (Some(recipient), Some(user_id)) => recipient == user_id,
            (Some(_), None) => false,
        }
    }
}

/// 通知扇出注册表
///
/// Clone 代价低（内部 DashMap 由 Arc 持有于 ServerState），注册、
/// 注销、广播都不需要外部锁。
#[derive(Debug, Default)]
pub struct NotificationHub {
    subscribers: DashMap<String, Subscriber>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning its id and the receiving end
    pub fn register(
        &self,
        user_id: Option<String>,
    ) -> (String, mpsc::UnboundedReceiver<NotificationPayload>) {
        let connection_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .insert(connection_id.clone(), Subscriber { tx, user_id });
        tracing::debug!(
            connection_id = %connection_id,
            online = self.connection_count(),
            "notification subscriber registered"
        );
        (connection_id, rx)
    }

    /// Remove a connection from the registry
    pub fn unregister(&self, connection_id: &str) {
        if self.subscribers.remove(connection_id).is_some() {
            tracing::debug!(
                connection_id = %connection_id,
                online = self.connection_count(),
                "notification subscriber unregistered"
            );
        }
    }

    /// Push a payload to every matching live connection
    ///
    /// 返回成功送达的连接数。
    pub fn broadcast(&self, payload: &NotificationPayload) -> usize {
        let mut delivered = 0;
        for entry in self.subscribers.iter() {
            if !entry.value().wants(payload) {
                continue;
            }
            // 发送失败说明对端 receiver 已丢弃，等连接的 Drop 注销
            if entry.value().tx.send(payload.clone()).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!(
            notification_id = %payload.id,
            delivered,
            "notification broadcast"
        );
        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::NotificationKind;

    fn broadcast_payload() -> NotificationPayload {
        NotificationPayload::broadcast(
            NotificationKind::Promotion,
            "Weekend deal",
            "Free delivery all weekend",
        )
    }

    #[test]
    fn test_broadcast_reaches_all_connections() {
        let hub = NotificationHub::new();
        let (_, mut rx_a) = hub.register(Some("user:alice".to_string()));
        let (_, mut rx_b) = hub.register(None);

        let delivered = hub.broadcast(&broadcast_payload());
        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_targeted_payload_matches_recipient_only() {
        let hub = NotificationHub::new();
        let (_, mut rx_alice) = hub.register(Some("user:alice".to_string()));
        let (_, mut rx_bob) = hub.register(Some("user:bob".to_string()));

        let payload = NotificationPayload::to_user(
            "user:alice",
            NotificationKind::Order,
            "Order update",
            "Your order is on the way",
        );
        let delivered = hub.broadcast(&payload);
        assert_eq!(delivered, 1);
        assert!(rx_alice.try_recv().is_ok());
        assert!(rx_bob.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_skipped() {
        let hub = NotificationHub::new();
        let (_, rx) = hub.register(None);
        drop(rx);
        let (_, mut live_rx) = hub.register(None);

        let delivered = hub.broadcast(&broadcast_payload());
        assert_eq!(delivered, 1);
        assert!(live_rx.try_recv().is_ok());
    }

    #[test]
    fn test_unregister_removes_connection() {
        let hub = NotificationHub::new();
        let (id, _rx) = hub.register(None);
        assert_eq!(hub.connection_count(), 1);
        hub.unregister(&id);
        assert_eq!(hub.connection_count(), 0);
    }
}
