use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::CatalogList,
    error::AppResult,
    middleware::auth::{AuthUser, ensure_customer},
    models::CatalogProduct,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

/// Customer-facing catalog. Both customer roles are admitted; the
/// price they see differs by role.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalog))
        .route("/{id}", get(get_catalog_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Catalog excluding the caller's own listings", body = ApiResponse<CatalogList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn list_catalog(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CatalogList>>> {
    ensure_customer(&user)?;
    let resp = product_service::list_catalog(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product with role-scoped price", body = ApiResponse<CatalogProduct>),
        (status = 404, description = "Not found or owned by the caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn get_catalog_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CatalogProduct>>> {
    ensure_customer(&user)?;
    let resp = product_service::get_catalog_product(&state, &user, id).await?;
    Ok(Json(resp))
}
