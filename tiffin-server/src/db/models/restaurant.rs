//! Restaurant Model
//!
//! 餐厅文档携带缓存聚合字段 `total_orders` / `revenue`，由
//! `orders::reconcile` 负责与订单表保持最终一致。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

/// Restaurant document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Display name — also a legacy join key against old order documents
    pub name: String,
    /// Owning seller user id
    #[serde(with = "serde_helpers::record_id")]
    pub owner: RecordId,
    pub address: String,
    pub cuisine: Option<String>,
    pub image_ref: Option<String>,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_open: bool,

    // ==== 缓存聚合字段 (最终一致，见 orders::reconcile) ====
    /// Count of non-cancelled orders; `None` until first reconciliation
    pub total_orders: Option<i64>,
    /// Sum of `total_amount` over delivered orders
    pub revenue: Option<f64>,

    pub created_at: String,
}

fn default_true() -> bool {
    true
}

impl Restaurant {
    /// 读侧兼容键集合
    ///
    /// 历史订单的 `restaurant` 字段既可能是记录 id 也可能是展示名，
    /// 聚合与归属判断必须同时匹配 `{id, 纯 key, name}` 三种形式。
    /// 新写入的订单只使用 id 形式。
    pub fn candidate_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(3);
        if let Some(id) = &self.id {
            keys.push(id.to_string());
            keys.push(id.key().to_string());
        }
        keys.push(self.name.clone());
        keys
    }
}

/// Register restaurant payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RestaurantCreate {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 256))]
    pub address: String,
    pub cuisine: Option<String>,
    pub image_ref: Option<String>,
}
