use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CheckoutReport, CheckoutRequest, OrderList, OrderWithItems, UpdateOrderCommentRequest,
        UpdateOrderStatusRequest,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_customer},
    response::ApiResponse,
    services::order_service,
    state::AppState,
    workflow::OrderActor,
};

/// Customer order surface, admitted for both customer roles.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/", get(list_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/status", put(update_status))
        .route("/{id}/comment", put(update_comment))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "One pending order per vendor group, with per-group failures", body = ApiResponse<CheckoutReport>),
        (status = 400, description = "Empty cart or no group could be created")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CheckoutReport>>)> {
    ensure_customer(&user)?;
    let resp = order_service::checkout(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders placed under the caller's current active role", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_customer(&user)?;
    let resp = order_service::list_customer_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with its line items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not found or not the caller's order"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    ensure_customer(&user)?;
    let resp = order_service::get_order(&state, &user, OrderActor::Customer, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<OrderWithItems>),
        (status = 409, description = "Order changed since it was read"),
        (status = 422, description = "Transition not in the customer table"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    ensure_customer(&user)?;
    let resp =
        order_service::update_status(&state, &user, OrderActor::Customer, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/comment",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderCommentRequest,
    responses(
        (status = 200, description = "Comment appended", body = ApiResponse<OrderWithItems>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderCommentRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    ensure_customer(&user)?;
    let resp =
        order_service::update_comment(&state, &user, OrderActor::Customer, id, payload).await?;
    Ok(Json(resp))
}
