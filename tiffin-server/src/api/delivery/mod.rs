//! 骑手接口
//!
//! 抢单走存储层的条件更新：两个骑手同时抢同一单时恰好一个成功，
//! 输家收到 409。

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/delivery/available", get(handler::list_available))
        .route("/api/delivery/accept-order/{id}", post(handler::accept_order))
        .route(
            "/api/delivery/update-status/{id}",
            patch(handler::update_status),
        )
}
