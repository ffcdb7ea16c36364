//! SSE 桥接
//!
//! 把注册表分发用的 mpsc channel 包装成 axum 的 SSE 事件流。
//! 流被 Drop（客户端断开）时自动从注册表注销。

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::response::sse::Event;
use futures::Stream;
use shared::NotificationPayload;
use tokio::sync::mpsc;

use super::NotificationHub;

/// Stream adapter over a hub subscription
pub struct HubStream {
    hub: Arc<NotificationHub>,
    connection_id: String,
    rx: mpsc::UnboundedReceiver<NotificationPayload>,
}

impl HubStream {
    /// Subscribe to the hub, optionally filtered to one user's notifications
    pub fn subscribe(hub: Arc<NotificationHub>, user_id: Option<String>) -> Self {
        let (connection_id, rx) = hub.register(user_id);
        Self {
            hub,
            connection_id,
            rx,
        }
    }
}

impl Stream for HubStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.rx.poll_recv(cx) {
                Poll::Ready(Some(payload)) => {
                    // 序列化失败理论上不会发生，发生就跳过这条
                    match Event::default().event("notification").json_data(&payload)
                    {
                        Ok(event) => return Poll::Ready(Some(Ok(event))),
                        Err(e) => {
                            tracing::warn!(
                                notification_id = %payload.id,
                                error = %e,
                                "failed to encode notification event"
                            );
                            continue;
                        }
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for HubStream {
    fn drop(&mut self) {
        self.hub.unregister(&self.connection_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use shared::NotificationKind;

    #[tokio::test]
    async fn test_stream_yields_broadcast_events() {
        let hub = Arc::new(NotificationHub::new());
        let mut stream = HubStream::subscribe(hub.clone(), None);

        hub.broadcast(&NotificationPayload::broadcast(
            NotificationKind::System,
            "Maintenance",
            "Scheduled downtime tonight",
        ));

        let event = stream.next().await;
        assert!(event.is_some());
    }

    #[tokio::test]
    async fn test_drop_unregisters_connection() {
        let hub = Arc::new(NotificationHub::new());
        let stream = HubStream::subscribe(hub.clone(), Some("user:alice".to_string()));
        assert_eq!(hub.connection_count(), 1);
        drop(stream);
        assert_eq!(hub.connection_count(), 0);
    }
}
