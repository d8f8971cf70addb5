use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem};
use crate::workflow::OrderStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutFailure {
    pub vendor_id: Uuid,
    pub error: String,
}

/// Checkout splits a mixed-vendor cart into one order per vendor.
/// Groups succeed or fail independently; the report names both so a
/// partial failure is never masked as success.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutReport {
    pub orders: Vec<OrderWithItems>,
    pub failures: Vec<CheckoutFailure>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

/// Status change with the optimistic concurrency token: the status the
/// caller last observed. The write only lands if the stored status
/// still matches.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub expected_status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderCommentRequest {
    pub comment: String,
}
