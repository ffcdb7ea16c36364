//! Order Repository
//!
//! 订单文档的读写。所有状态推进都先经过 `orders::lifecycle` 的
//! 状态机检查，repository 只负责持久化。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Order;
use crate::utils::time;
use shared::OrderStatus;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a freshly priced order
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find order by id ("order:xyz")
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("Invalid order ID format: {}", id)))?;
        let order: Option<Order> = self.base.db().select(record_id).await?;
        Ok(order)
    }

    /// List a customer's orders, newest first
    pub async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Order>> {
        let customer: RecordId = customer_id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("Invalid user ID format: {}", customer_id)))?;
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE customer = $customer ORDER BY created_at DESC")
            .bind(("customer", customer.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// List orders matching any of a restaurant's candidate keys, newest first
    ///
    /// 兼容遗留数据：`restaurant` 字段可能是 id 或展示名
    pub async fn find_by_restaurant_keys(&self, keys: &[String]) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE restaurant IN $keys ORDER BY created_at DESC")
            .bind(("keys", keys.to_vec()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders ready for pickup with no assigned partner
    pub async fn find_available_for_delivery(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order \
                 WHERE status = 'ready' AND delivery_partner = NONE \
                 ORDER BY created_at",
            )
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// List all orders (admin console), newest first
    pub async fn find_all(&self, limit: i64, start: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC LIMIT $limit START $start")
            .bind(("limit", limit))
            .bind(("start", start))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Set a new status, refreshing `updated_at` and nothing else
    pub async fn update_status(&self, id: &RecordId, status: OrderStatus) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET status = $status, updated_at = $now RETURN AFTER")
            .bind(("id", id.clone()))
            .bind(("status", status.as_str().to_string()))
            .bind(("now", time::now_rfc3339()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Conditional acceptance: assign the partner only while the order is
    /// still `ready` and unassigned
    ///
    /// 两个骑手并发抢单时恰好一个成功；输家拿到 `None`。
    pub async fn try_assign_partner(
        &self,
        id: &RecordId,
        partner: &RecordId,
    ) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET \
                     delivery_partner = $partner, \
                     status = 'out-for-delivery', \
                     updated_at = $now \
                 WHERE status = 'ready' AND delivery_partner = NONE \
                 RETURN AFTER",
            )
            .bind(("id", id.clone()))
            .bind(("partner", partner.to_string()))
            .bind(("now", time::now_rfc3339()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }
}
