use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_vendor},
    models::Product,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

/// Vendor catalog management, scoped to the caller's own tenant.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/{id}", get(get_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
}

#[utoipa::path(
    get,
    path = "/api/vendor/products",
    responses(
        (status = 200, description = "The caller's own products", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    ensure_vendor(&user)?;
    let resp = product_service::list_own_products(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/vendor/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Product created under the caller's tenant", body = ApiResponse<Product>)
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_vendor(&user)?;
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendor/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product", body = ApiResponse<Product>),
        (status = 404, description = "Not found in the caller's tenant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_vendor(&user)?;
    let resp = product_service::get_own_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/vendor/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>)
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_vendor(&user)?;
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/vendor/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found in the caller's tenant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_vendor(&user)?;
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}
