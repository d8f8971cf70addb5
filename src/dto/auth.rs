use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;
use crate::roles::Role;

#[derive(Deserialize, Debug, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub user: User,
    /// Present only when a new account was created; redeemed at
    /// `/api/auth/verify-email` before the first login.
    pub verification_token: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Role to act under for this session; must already be held.
    pub role: Role,
}

/// The client-held session: bearer token plus the user it represents.
/// Returned by login and by switch-role, which reissues the token with
/// a new active-role claim.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SwitchRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct RoleList {
    #[schema(value_type = Vec<Role>)]
    pub roles: Vec<Role>,
}

/// Bearer token claims. `role` is the active-role claim set by the
/// application, not by the identity layer itself.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// Single-purpose claims for the email verification token.
#[derive(Debug, Deserialize, Serialize)]
pub struct VerifyEmailClaims {
    pub sub: String,
    pub purpose: String,
    pub exp: usize,
}
