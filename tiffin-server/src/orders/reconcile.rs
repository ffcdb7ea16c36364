//! 餐厅聚合字段对账
//!
//! 餐厅文档上的 `total_orders` / `revenue` 是缓存值，真实来源永远是
//! 订单表。每次改变订单集合的操作（下单、取消、送达、管理员改状态）
//! 之后重算一次并在不一致时覆盖写回。
//!
//! 对账失败只记日志，绝不让父请求失败。

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::Restaurant;
use crate::db::repository::{RepoResult, RestaurantRepository};

/// Aggregates derived from the order table
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RestaurantAggregates {
    /// Orders counted against the restaurant (cancelled excluded)
    pub total_orders: i64,
    /// Sum of `total_amount` over delivered orders
    pub revenue: f64,
}

#[derive(Debug, serde::Deserialize)]
struct CountRow {
    total: i64,
}

#[derive(Debug, serde::Deserialize)]
struct RevenueRow {
    revenue: Option<f64>,
}

/// Recompute aggregates for a restaurant from its candidate keys
///
/// 候选键集合兼容遗留订单（`restaurant` 字段可能是 id 或展示名）。
pub async fn compute_aggregates(
    db: &Surreal<Db>,
    keys: &[String],
) -> RepoResult<RestaurantAggregates> {
    let mut result = db
        .query(
            "SELECT count() AS total FROM order \
             WHERE restaurant IN $keys AND status != 'cancelled' GROUP ALL",
        )
        .bind(("keys", keys.to_vec()))
        .await?;
    let counts: Vec<CountRow> = result.take(0)?;
    let total_orders = counts.first().map(|row| row.total).unwrap_or(0);

    let mut result = db
        .query(
            "SELECT math::sum(total_amount) AS revenue FROM order \
             WHERE restaurant IN $keys AND status = 'delivered' GROUP ALL",
        )
        .bind(("keys", keys.to_vec()))
        .await?;
    let revenues: Vec<RevenueRow> = result.take(0)?;
    let revenue = revenues
        .first()
        .and_then(|row| row.revenue)
        .unwrap_or(0.0);

    Ok(RestaurantAggregates {
        total_orders,
        revenue,
    })
}

/// Recompute and overwrite a restaurant's cached aggregates when stale
///
/// 策略是 always-overwrite：派生值和缓存值不同就整体覆盖，不做
/// 方向性判断。返回写回后的聚合值。
pub async fn reconcile(
    db: &Surreal<Db>,
    restaurant: &Restaurant,
) -> RepoResult<RestaurantAggregates> {
    let keys = restaurant.candidate_keys();
    let derived = compute_aggregates(db, &keys).await?;

    let cached_orders = restaurant.total_orders.unwrap_or(0);
    let cached_revenue = restaurant.revenue.unwrap_or(0.0);
    if derived.total_orders != cached_orders || derived.revenue != cached_revenue {
        if let Some(id) = &restaurant.id {
            RestaurantRepository::new(db.clone())
                .update_aggregates(id, derived.total_orders, derived.revenue)
                .await?;
            tracing::debug!(
                restaurant = %id,
                total_orders = derived.total_orders,
                revenue = derived.revenue,
                "restaurant aggregates reconciled"
            );
        }
    }
    Ok(derived)
}

/// Best-effort reconciliation keyed by an order's restaurant reference
///
/// 找不到餐厅或写回失败都只记 warn，调用方不感知。
pub async fn reconcile_for_reference(db: &Surreal<Db>, reference: &str) {
    let repo = RestaurantRepository::new(db.clone());
    match repo.resolve_reference(reference).await {
        Ok(Some(restaurant)) => {
            if let Err(err) = reconcile(db, &restaurant).await {
                tracing::warn!(
                    restaurant = %reference,
                    error = %err,
                    "restaurant aggregate reconciliation failed"
                );
            }
        }
        Ok(None) => {
            tracing::warn!(
                restaurant = %reference,
                "order references an unknown restaurant, skipping reconciliation"
            );
        }
        Err(err) => {
            tracing::warn!(
                restaurant = %reference,
                error = %err,
                "failed to resolve restaurant for reconciliation"
            );
        }
    }
}
