//! 通知扇出
//!
//! 进程内的 SSE 连接注册表：每条连接在 [`NotificationHub`] 注册一个
//! 无界 channel，广播时按收件人匹配推送。连接断开即注销，没有跨进程
//! 状态。
//!
//! - [`registry`] - 连接注册表与广播
//! - [`sse`] - channel 到 SSE 事件流的桥接

pub mod registry;
pub mod sse;

pub use registry::NotificationHub;
pub use sse::HubStream;
