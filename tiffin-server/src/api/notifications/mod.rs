//! 通知接口
//!
//! 历史列表走持久化表，实时推送走 SSE。两条路径承载同一种负载：
//! 连接在线时从流里收到的，和掉线重连后从列表里补到的完全一致。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/notifications", get(handler::list))
        .route("/api/notifications/stream", get(handler::stream))
}
