//! 商家接口
//!
//! 商家只能看到并操作自己餐厅的订单。读餐厅详情时顺带对账一次，
//! 保证返回的聚合字段和订单表一致。

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/seller/restaurant",
            post(handler::create_restaurant).get(handler::get_restaurant),
        )
        .route("/api/seller/orders", get(handler::list_orders))
        .route("/api/seller/orders/{id}", patch(handler::update_order_status))
}
