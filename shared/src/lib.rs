//! Tiffin 共享类型库
//!
//! 服务端与各角色客户端（顾客 / 商家 / 骑手 / 管理后台）之间共享的
//! 契约类型：
//!
//! - [`order`] - 订单状态机的状态集合
//! - [`notification`] - SSE 通知负载

pub mod notification;
pub mod order;

pub use notification::{NotificationKind, NotificationPayload};
pub use order::OrderStatus;
