//! 顾客订单接口
//!
//! 下单、查询自己的订单、取消。归属不匹配一律报 404 而不是 403，
//! 避免暴露他人订单的存在。

pub(crate) mod handler;

pub(crate) use handler::UpdateStatusRequest;

use axum::{
    Router,
    routing::{post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(handler::create).get(handler::list_own))
        .route("/api/orders/{id}", put(handler::cancel))
}

/// 路径参数既接受完整 id (`order:xyz`) 也接受纯 key
pub(crate) fn normalize_order_id(raw: &str) -> String {
    if raw.contains(':') {
        raw.to_string()
    } else {
        format!("order:{}", raw)
    }
}
