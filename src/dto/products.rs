use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CatalogProduct, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
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
}

/// Partial update; `tenant_id` is never updatable.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub retail_price_cents: Option<i64>,
    pub b2b_price_cents: Option<i64>,
    pub paid_cost_cents: Option<i64>,
    pub allow_loose: Option<bool>,
    pub min_quantity: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CatalogList {
    #[schema(value_type = Vec<CatalogProduct>)]
    pub items: Vec<CatalogProduct>,
}
