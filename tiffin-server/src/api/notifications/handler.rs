use std::time::Duration;

use axum::{
    Json,
    extract::State,
    response::sse::{KeepAlive, KeepAliveStream, Sse},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::NotificationDoc;
use crate::db::repository::NotificationRepository;
use crate::notify::HubStream;
use crate::utils::{AppResponse, AppResult, ok};

/// GET /api/notifications
///
/// 定向给当前用户的通知加上全部广播，按时间倒序。
pub async fn list(
    user: CurrentUser,
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<NotificationDoc>>>> {
    let docs = NotificationRepository::new(state.get_db())
        .list_for_user(&user.id, state.config.notification_history_limit)
        .await?;
    Ok(ok(docs))
}

/// GET /api/notifications/stream
///
/// SSE 长连接。连接断开时 [`HubStream`] 的 Drop 自动从注册表注销，
/// keep-alive 帧防止中间代理掐掉空闲连接。
pub async fn stream(
    user: CurrentUser,
    State(state): State<ServerState>,
) -> Sse<KeepAliveStream<HubStream>> {
    let stream = HubStream::subscribe(state.hub.clone(), Some(user.id));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
