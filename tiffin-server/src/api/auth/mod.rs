//! 认证接口
//!
//! 注册与登录都返回 access token，客户端放在 `Authorization: Bearer`
//! 头里访问受保护端点。

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/register", post(handler::register))
        .route("/api/auth/login", post(handler::login))
}
