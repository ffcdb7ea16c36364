//! 订单状态机
//!
//! 唯一的状态转移表。每个端点都通过 [`next_status`] 推进状态，
//! 任何地方都不允许各自推导允许的转移。
//!
//! # 转移表
//!
//! | 角色 | 允许的转移 |
//! |------|-----------|
//! | customer | 任一 [`CUSTOMER_CANCELLABLE`] 状态 → cancelled |
//! | seller | pending → confirmed → preparing → ready; pending → cancelled |
//! | delivery | confirmed → picked-up → out-for-delivery → delivered |
//! | admin | 任意状态强制覆盖 |
//!
//! 抢单（ready → out-for-delivery + 骑手指派）不走本表，见
//! [`can_accept`] 与 `OrderRepository::try_assign_partner` 的条件更新。

use shared::OrderStatus;

use crate::auth::Role;
use crate::utils::AppError;

/// 顾客可取消的状态集合
///
/// 策略决定：骑手接单（进入 picked-up / out-for-delivery）之前都可以
/// 取消，之后不可以。已取消订单再取消报 Validation，已送达报 Forbidden。
pub const CUSTOMER_CANCELLABLE: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
];

/// 骑手显式状态编辑允许的目标集合
pub const DELIVERY_SETTABLE: &[OrderStatus] = &[
    OrderStatus::PickedUp,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
];

/// Compute the next status for a role-scoped transition
///
/// 返回 `Ok(target)` 表示转移被接受；调用方负责持久化与副作用
/// （对账、通知）。归属检查（订单属于谁）在调用方完成，属于谁的
/// 问题报 NotFound 而不是 Forbidden。
pub fn next_status(
    current: OrderStatus,
    requested: OrderStatus,
    role: Role,
) -> Result<OrderStatus, AppError> {
    match role {
        // 管理员强制覆盖，不检查转移表
        Role::Admin => Ok(requested),

        Role::Customer => {
            if requested != OrderStatus::Cancelled {
                return Err(AppError::forbidden(
                    "Customers may only cancel their orders",
                ));
            }
            if current == OrderStatus::Cancelled {
                return Err(AppError::validation("Order already cancelled"));
            }
            if !CUSTOMER_CANCELLABLE.contains(&current) {
                return Err(AppError::forbidden(format!(
                    "Order can no longer be cancelled (status: {})",
                    current
                )));
            }
            Ok(OrderStatus::Cancelled)
        }

        Role::Seller => match (current, requested) {
            (OrderStatus::Pending, OrderStatus::Confirmed)
            | (OrderStatus::Confirmed, OrderStatus::Preparing)
            | (OrderStatus::Preparing, OrderStatus::Ready)
            | (OrderStatus::Pending, OrderStatus::Cancelled) => Ok(requested),
            _ => Err(AppError::forbidden(format!(
                "Transition {} -> {} not permitted for seller",
                current, requested
            ))),
        },

        Role::Delivery => match (current, requested) {
            (OrderStatus::Confirmed, OrderStatus::PickedUp)
            | (OrderStatus::PickedUp, OrderStatus::OutForDelivery)
            | (OrderStatus::OutForDelivery, OrderStatus::Delivered) => Ok(requested),
            _ => Err(AppError::forbidden(format!(
                "Transition {} -> {} not permitted for delivery partner",
                current, requested
            ))),
        },
    }
}

/// 抢单前置条件：订单处于 ready
///
/// 真正的防并发保证在存储层的条件更新里，这里只用于提前给出
/// 友好的错误。
pub fn can_accept(current: OrderStatus) -> bool {
    current == OrderStatus::Ready
}

/// 创建时允许的初始状态
///
/// 公开结算路径会显式传 confirmed，不传则默认 pending。
pub fn initial_status(requested: Option<OrderStatus>) -> Result<OrderStatus, AppError> {
    match requested {
        None => Ok(OrderStatus::Pending),
        Some(OrderStatus::Pending) => Ok(OrderStatus::Pending),
        Some(OrderStatus::Confirmed) => Ok(OrderStatus::Confirmed),
        Some(other) => Err(AppError::validation(format!(
            "Invalid initial status: {}",
            other
        ))),
    }
}
