//! HTTP API 路由
//!
//! 每个子模块提供一个 `router()`，由 `core::server::build_app` 合并。
//! 所有受保护端点通过 [`crate::auth::CurrentUser`] extractor 认证，
//! 角色检查在各 handler 内完成（admin 对任何角色检查都放行）。
//!
//! | 模块 | 前缀 | 角色 |
//! |------|------|------|
//! | auth | /api/auth | 公开 |
//! | health | /api/health | 公开 |
//! | restaurants | /api/restaurants | 公开 |
//! | orders | /api/orders | customer |
//! | seller | /api/seller | seller |
//! | delivery | /api/delivery | delivery |
//! | admin | /api/admin | admin |
//! | notifications | /api/notifications | 任意登录用户 |

pub mod admin;
pub mod auth;
pub mod delivery;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod restaurants;
pub mod seller;
