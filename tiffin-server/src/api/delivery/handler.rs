use axum::{
    Json,
    extract::{Path, State},
};
use shared::{NotificationKind, NotificationPayload, OrderStatus};

use crate::api::orders::{UpdateStatusRequest, normalize_order_id};
use crate::auth::{CurrentUser, Role};
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::orders::{lifecycle, reconcile};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// GET /api/delivery/available
///
/// 所有 ready 且未被抢的订单，先到先得。
pub async fn list_available(
    user: CurrentUser,
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    user.require_role(Role::Delivery)?;
    let orders = OrderRepository::new(state.get_db())
        .find_available_for_delivery()
        .await?;
    Ok(ok(orders))
}

/// POST /api/delivery/accept-order/{id}
///
/// 真正的防并发在 `try_assign_partner` 的条件更新里；这里的
/// `can_accept` 预检只为给出更友好的错误。条件更新没命中就是
/// 被别人抢了，报 409。
pub async fn accept_order(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require_role(Role::Delivery)?;

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&normalize_order_id(&id))
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if !lifecycle::can_accept(order.status) {
        return Err(AppError::conflict("Order is no longer available"));
    }

    let order_id = order
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Stored order has no id"))?;
    let partner = user
        .id
        .parse()
        .map_err(|_| AppError::internal(format!("Invalid user id in token: {}", user.id)))?;

    // 抢单只指派骑手，不发通知；顾客侧的通知由后续状态推进触发
    let accepted = repo
        .try_assign_partner(order_id, &partner)
        .await?
        .ok_or_else(|| AppError::conflict("Order was already taken"))?;

    Ok(ok_with_message(accepted, "Order accepted"))
}

/// PATCH /api/delivery/update-status/{id}
///
/// 只有被指派的骑手能推进；送达后对账（revenue 只计已送达订单）
/// 并通知顾客。
pub async fn update_status(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require_role(Role::Delivery)?;

    if !lifecycle::DELIVERY_SETTABLE.contains(&payload.status) {
        return Err(AppError::validation(format!(
            "Delivery partners cannot set status {}",
            payload.status
        )));
    }

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&normalize_order_id(&id))
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    // 未指派给当前骑手的订单当作不存在
    let assigned = order
        .delivery_partner
        .as_ref()
        .map(|partner| partner.to_string() == user.id)
        .unwrap_or(false);
    if !user.is_admin() && !assigned {
        return Err(AppError::not_found("Order not found"));
    }

    let next = lifecycle::next_status(order.status, payload.status, user.role)?;
    let order_id = order
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Stored order has no id"))?;
    let updated = repo.update_status(order_id, next).await?;

    if next == OrderStatus::Delivered {
        reconcile::reconcile_for_reference(&state.db, &updated.restaurant).await;
        state
            .publish_notification(NotificationPayload::to_user(
                updated.customer.to_string(),
                NotificationKind::Delivery,
                "Order delivered",
                "Your order has been delivered. Enjoy!",
            ))
            .await;
    } else {
        state
            .publish_notification(NotificationPayload::to_user(
                updated.customer.to_string(),
                NotificationKind::Delivery,
                "Delivery update",
                format!("Your order is now {}", next),
            ))
            .await;
    }

    Ok(ok(updated))
}
