use axum::{
    Json,
    extract::{Path, State},
};
use shared::{NotificationKind, NotificationPayload};
use validator::Validate;

use crate::api::orders::{UpdateStatusRequest, normalize_order_id};
use crate::auth::{CurrentUser, Role};
use crate::core::ServerState;
use crate::db::models::{Order, Restaurant, RestaurantCreate};
use crate::db::repository::{OrderRepository, RestaurantRepository};
use crate::orders::{lifecycle, reconcile};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// 取当前商家的餐厅，没有注册过报 404
async fn owned_restaurant(state: &ServerState, user: &CurrentUser) -> AppResult<Restaurant> {
    RestaurantRepository::new(state.get_db())
        .find_by_owner(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("No restaurant registered for this account"))
}

/// POST /api/seller/restaurant
pub async fn create_restaurant(
    user: CurrentUser,
    State(state): State<ServerState>,
    Json(payload): Json<RestaurantCreate>,
) -> AppResult<Json<AppResponse<Restaurant>>> {
    user.require_role(Role::Seller)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let created = RestaurantRepository::new(state.get_db())
        .create(&user.id, payload)
        .await?;
    Ok(ok_with_message(created, "Restaurant registered"))
}

/// GET /api/seller/restaurant
///
/// 返回前先对账，聚合字段永远反映订单表的当前派生值。
pub async fn get_restaurant(
    user: CurrentUser,
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Restaurant>>> {
    user.require_role(Role::Seller)?;
    let mut restaurant = owned_restaurant(&state, &user).await?;

    match reconcile::reconcile(&state.db, &restaurant).await {
        Ok(aggregates) => {
            restaurant.total_orders = Some(aggregates.total_orders);
            restaurant.revenue = Some(aggregates.revenue);
        }
        // 对账失败退回缓存值，不让读路径失败
        Err(e) => {
            tracing::warn!(error = %e, "aggregate reconciliation failed on read");
        }
    }

    Ok(ok(restaurant))
}

/// GET /api/seller/orders
pub async fn list_orders(
    user: CurrentUser,
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    user.require_role(Role::Seller)?;
    let restaurant = owned_restaurant(&state, &user).await?;

    let orders = OrderRepository::new(state.get_db())
        .find_by_restaurant_keys(&restaurant.candidate_keys())
        .await?;
    Ok(ok(orders))
}

/// PATCH /api/seller/orders/{id}
///
/// 商家推进 pending → confirmed → preparing → ready，或在 pending
/// 阶段拒单。每次推进都通知顾客并对账。
pub async fn update_order_status(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require_role(Role::Seller)?;
    let restaurant = owned_restaurant(&state, &user).await?;

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&normalize_order_id(&id))
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    // 别家餐厅的订单当作不存在
    if !user.is_admin() && !restaurant.candidate_keys().contains(&order.restaurant) {
        return Err(AppError::not_found("Order not found"));
    }

    let next = lifecycle::next_status(order.status, payload.status, user.role)?;
    let order_id = order
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Stored order has no id"))?;
    let updated = repo.update_status(order_id, next).await?;

    // 每次商家推进都对账一次，顺带修复早前被吞掉的对账失败
    reconcile::reconcile_for_reference(&state.db, &updated.restaurant).await;

    state
        .publish_notification(NotificationPayload::to_user(
            updated.customer.to_string(),
            NotificationKind::Order,
            "Order update",
            format!("Your order at {} is now {}", restaurant.name, next),
        ))
        .await;

    Ok(ok(updated))
}
