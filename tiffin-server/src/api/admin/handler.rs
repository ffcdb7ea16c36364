use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::{NotificationKind, NotificationPayload};

use crate::api::orders::{UpdateStatusRequest, normalize_order_id};
use crate::auth::{CurrentUser, Role};
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::orders::{lifecycle, reconcile};
use crate::utils::{AppError, AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub start: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

/// GET /api/admin/orders?limit=&start=
pub async fn list_orders(
    user: CurrentUser,
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    user.require_role(Role::Admin)?;

    let limit = page
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let start = page.start.unwrap_or(0).max(0);

    let orders = OrderRepository::new(state.get_db())
        .find_all(limit, start)
        .await?;
    Ok(ok(orders))
}

/// PATCH /api/admin/orders/{id}
///
/// 强制覆盖状态。覆盖可能改变聚合口径（取消、送达都影响），所以
/// 无条件对账一次。
pub async fn force_status(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require_role(Role::Admin)?;

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&normalize_order_id(&id))
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let next = lifecycle::next_status(order.status, payload.status, Role::Admin)?;
    let order_id = order
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Stored order has no id"))?;
    let updated = repo.update_status(order_id, next).await?;

    reconcile::reconcile_for_reference(&state.db, &updated.restaurant).await;
    state
        .publish_notification(NotificationPayload::to_user(
            updated.customer.to_string(),
            NotificationKind::System,
            "Order updated",
            format!("Order {} was set to {} by support", order_id, next),
        ))
        .await;

    Ok(ok(updated))
}
