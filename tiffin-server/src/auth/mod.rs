//! 认证授权模块
//!
//! 提供 JWT 认证与角色判定：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文 (axum extractor)
//! - [`Role`] - 平台角色 (顾客 / 商家 / 骑手 / 管理员)

pub mod extractor;
pub mod jwt;
pub mod roles;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use roles::Role;
