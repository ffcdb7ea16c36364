//! Order Model
//!
//! 订单文档。`restaurant` 字段是字符串：历史数据既有记录 id 也有餐厅
//! 展示名（遗留格式），读侧统一用候选键集合匹配；新订单只写 id 形式。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::OrderStatus;
use surrealdb::RecordId;
use validator::Validate;

/// Single line item — immutable once the order is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub unit_price: f64,
    pub quantity: i32,
    pub image_ref: Option<String>,
}

/// Delivery address snapshot, copied at creation time
///
/// 不引用顾客当前保存的地址，下单后顾客改地址不影响已有订单。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub phone: Option<String>,
}

/// Order document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Owning customer
    #[serde(with = "serde_helpers::record_id")]
    pub customer: RecordId,
    /// Restaurant reference: record id string on new writes, possibly a
    /// display name on legacy documents
    pub restaurant: String,
    pub items: Vec<OrderItem>,
    pub delivery_fee: f64,
    /// subtotal(items) + delivery_fee, fixed at creation
    pub total_amount: f64,
    /// Sum across sibling orders of the same checkout; present only when the
    /// checkout spanned several restaurants and justified a waived fee
    pub combined_total_amount: Option<f64>,
    pub status: OrderStatus,
    /// Assigned delivery partner, set by the accept flow
    ///
    /// 未分配时字段不写入，保证 CAS 条件 `delivery_partner = NONE` 成立
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub delivery_partner: Option<RecordId>,
    pub delivery_address: DeliveryAddress,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    /// Derived items subtotal (not stored)
    pub fn subtotal(&self) -> f64 {
        crate::orders::pricing::subtotal(&self.items)
    }
}

/// Checkout payload for one order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderCreate {
    /// Restaurant record id ("restaurant:xyz") or display name
    #[validate(length(min = 1))]
    pub restaurant: String,
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    /// Only `pending` and `confirmed` are accepted as initial values
    pub initial_status: Option<OrderStatus>,
    /// Combined checkout total, used only for the free-delivery threshold
    pub combined_total_amount: Option<f64>,
}
