use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{
        LoginRequest, RoleList, SessionResponse, SignupRequest, SignupResponse,
        SwitchRoleRequest, VerifyEmailRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verify-email", post(verify_email))
        .route("/login", post(login))
        .route("/roles", get(list_roles))
        .route("/switch-role", post(switch_role))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created or role added", body = ApiResponse<SignupResponse>),
        (status = 409, description = "Role already held by this account")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<Json<ApiResponse<SignupResponse>>> {
    let resp = auth_service::signup(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified"),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "Auth"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::verify_email(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = ApiResponse<SessionResponse>),
        (status = 401, description = "Wrong password"),
        (status = 403, description = "Role not held or email unverified"),
        (status = 404, description = "Unknown account")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let resp = auth_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/roles",
    responses(
        (status = 200, description = "Roles held by the caller", body = ApiResponse<RoleList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RoleList>>> {
    let resp = auth_service::list_roles(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/switch-role",
    request_body = SwitchRoleRequest,
    responses(
        (status = 200, description = "Credential reissued for the new active role", body = ApiResponse<SessionResponse>),
        (status = 403, description = "Role not held")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn switch_role(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SwitchRoleRequest>,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let resp = auth_service::switch_role(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user profile", body = ApiResponse<User>)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::me(&state, &user).await?;
    Ok(Json(resp))
}
