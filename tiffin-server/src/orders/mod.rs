//! 订单领域逻辑
//!
//! # 模块结构
//!
//! - [`lifecycle`] - 按角色约束的状态机（全部端点共用的唯一转移表）
//! - [`pricing`] - 小计 / 配送费 / 总价计算
//! - [`reconcile`] - 餐厅聚合字段对账

pub mod lifecycle;
pub mod pricing;
pub mod reconcile;

pub use reconcile::RestaurantAggregates;
