use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::{NotificationKind, NotificationPayload, OrderStatus};
use validator::Validate;

use super::normalize_order_id;
use crate::auth::{CurrentUser, Role};
use crate::core::ServerState;
use crate::db::models::{Order, OrderCreate};
use crate::db::repository::{OrderRepository, RestaurantRepository};
use crate::orders::{lifecycle, pricing, reconcile};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message, time};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// POST /api/orders
///
/// 下单流程：解析餐厅引用（id 或遗留展示名，落库统一写 id 形式）、
/// 服务端计价、写入订单，然后对账 + 通知商家。
pub async fn create(
    user: CurrentUser,
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require_role(Role::Customer)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let restaurant_repo = RestaurantRepository::new(state.get_db());
    let restaurant = restaurant_repo
        .resolve_reference(&payload.restaurant)
        .await?
        .ok_or_else(|| AppError::not_found("Restaurant not found"))?;
    if !restaurant.is_open {
        return Err(AppError::validation("Restaurant is currently closed"));
    }
    // 新订单只写 id 形式，展示名引用只为兼容旧客户端
    let restaurant_key = restaurant
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| payload.restaurant.clone());

    let status = lifecycle::initial_status(payload.initial_status)?;
    let priced = pricing::price_order(
        &payload.items,
        payload.combined_total_amount,
        state.config.free_delivery_threshold,
        state.config.delivery_fee,
    )?;

    let customer = user
        .id
        .parse()
        .map_err(|_| AppError::internal(format!("Invalid user id in token: {}", user.id)))?;
    let now = time::now_rfc3339();
    let order = Order {
        id: None,
        customer,
        restaurant: restaurant_key.clone(),
        items: payload.items,
        delivery_fee: priced.delivery_fee,
        total_amount: priced.total_amount,
        combined_total_amount: payload.combined_total_amount,
        status,
        delivery_partner: None,
        delivery_address: payload.delivery_address,
        created_at: now.clone(),
        updated_at: now,
    };

    let created = OrderRepository::new(state.get_db()).create(order).await?;

    reconcile::reconcile_for_reference(&state.db, &restaurant_key).await;
    state
        .publish_notification(
            NotificationPayload::to_user(
                restaurant.owner.to_string(),
                NotificationKind::Order,
                "New order",
                format!("{} placed an order at {}", user.username, restaurant.name),
            ),
        )
        .await;

    Ok(ok_with_message(created, "Order placed"))
}

/// GET /api/orders
pub async fn list_own(
    user: CurrentUser,
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    user.require_role(Role::Customer)?;
    let orders = OrderRepository::new(state.get_db())
        .find_by_customer(&user.id)
        .await?;
    Ok(ok(orders))
}

/// PUT /api/orders/{id}
///
/// 顾客只允许请求 cancelled；窗口与重复取消的判定都在状态机里。
pub async fn cancel(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require_role(Role::Customer)?;

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&normalize_order_id(&id))
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    // 归属检查：别人的订单当作不存在
    if !user.is_admin() && order.customer.to_string() != user.id {
        return Err(AppError::not_found("Order not found"));
    }

    let next = lifecycle::next_status(order.status, payload.status, user.role)?;
    let order_id = order
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Stored order has no id"))?;
    let updated = repo.update_status(order_id, next).await?;

    reconcile::reconcile_for_reference(&state.db, &updated.restaurant).await;

    // 通知商家订单被取消 (找不到餐厅时静默跳过)
    let restaurant_repo = RestaurantRepository::new(state.get_db());
    if let Ok(Some(restaurant)) = restaurant_repo.resolve_reference(&updated.restaurant).await {
        state
            .publish_notification(NotificationPayload::to_user(
                restaurant.owner.to_string(),
                NotificationKind::Order,
                "Order cancelled",
                format!("Order {} was cancelled by the customer", order_id),
            ))
            .await;
    }

    Ok(ok_with_message(updated, "Order cancelled"))
}
