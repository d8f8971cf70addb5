use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems, UpdateOrderCommentRequest, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_vendor},
    response::ApiResponse,
    services::order_service,
    state::AppState,
    workflow::OrderActor,
};

/// Vendor side of the order workflow: every order bound to the vendor,
/// whatever customer role placed it.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/status", put(update_status))
        .route("/{id}/comment", put(update_comment))
}

#[utoipa::path(
    get,
    path = "/api/vendor/orders",
    responses(
        (status = 200, description = "Orders bound to the caller's vendor id", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_vendor(&user)?;
    let resp = order_service::list_vendor_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendor/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with its line items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not found or not the caller's order"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    ensure_vendor(&user)?;
    let resp = order_service::get_order(&state, &user, OrderActor::Vendor, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/vendor/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<OrderWithItems>),
        (status = 409, description = "Order changed since it was read"),
        (status = 422, description = "Transition not in the vendor table"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    ensure_vendor(&user)?;
    let resp = order_service::update_status(&state, &user, OrderActor::Vendor, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/vendor/orders/{id}/comment",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderCommentRequest,
    responses(
        (status = 200, description = "Comment appended", body = ApiResponse<OrderWithItems>)
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor orders"
)]
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderCommentRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    ensure_vendor(&user)?;
    let resp =
        order_service::update_comment(&state, &user, OrderActor::Vendor, id, payload).await?;
    Ok(Json(resp))
}
