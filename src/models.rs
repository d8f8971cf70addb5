use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::roles::Role;
use crate::workflow::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    /// Every role this account has signed up under.
    pub roles: Vec<Role>,
    /// The role the account currently acts as; always a member of `roles`.
    pub active_role: Role,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Vendor-facing product record with the full price breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    /// Owning vendor; fixed at creation.
    pub tenant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub stock: i32,
    pub retail_price_cents: i64,
    pub b2b_price_cents: i64,
    pub paid_cost_cents: i64,
    pub allow_loose: bool,
    pub min_quantity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Customer-facing view of a product: one unit price, selected by the
/// caller's active role, and no vendor cost columns.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub stock: i32,
    pub unit_price_cents: i64,
    pub allow_loose: bool,
    pub min_quantity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Role the customer was acting under at checkout.
    pub placed_as: Role,
    pub vendor_id: Uuid,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub customer_comment: String,
    pub vendor_comment: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    /// Name snapshot taken at checkout; later renames do not rewrite
    /// order history.
    pub name: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
}
