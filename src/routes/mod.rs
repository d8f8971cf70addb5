use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod health;
pub mod orders;
pub mod products;
pub mod vendor_orders;
pub mod vendor_products;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/vendor/products", vendor_products::router())
        .nest("/orders", orders::router())
        .nest("/vendor/orders", vendor_orders::router())
}
