//! 管理接口
//!
//! 管理员可以翻阅全部订单并强制覆盖任意状态（不走角色状态机），
//! 覆盖后照常对账和通知，保证聚合字段与订单表收敛。

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/admin/orders", get(handler::list_orders))
        .route("/api/admin/orders/{id}", patch(handler::force_status))
}
