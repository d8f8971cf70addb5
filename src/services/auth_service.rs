use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Header, Validation, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::AuditEntry,
    dto::auth::{
        Claims, LoginRequest, RoleList, SessionResponse, SignupRequest, SignupResponse,
        SwitchRoleRequest, VerifyEmailClaims, VerifyEmailRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    roles::Role,
    state::AppState,
};

const SESSION_TTL_HOURS: i64 = 24;
const VERIFY_EMAIL_PURPOSE: &str = "verify-email";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    display_name: Option<String>,
    active_role: String,
    email_verified: bool,
    created_at: DateTime<Utc>,
}

/// Sign up under a role. A new email creates the account with a
/// single-role set; an existing email grows the role set instead,
/// after proving the password. Signing up under a role already held
/// is a conflict, never a silent success.
pub async fn signup(
    state: &AppState,
    payload: SignupRequest,
) -> AppResult<ApiResponse<SignupResponse>> {
    let SignupRequest {
        email,
        password,
        role,
        display_name,
    } = payload;

    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation("email and password are required".into()));
    }

    let existing = fetch_user_by_email(&state.pool, &email).await?;

    let resp = match existing {
        Some(row) => {
            verify_password(&password, &row.password_hash)?;

            let mut roles = fetch_roles(&state.pool, row.id).await?;
            if roles.contains(&role) {
                return Err(AppError::RoleAlreadyExists(role));
            }

            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(row.id)
                .bind(role.as_str())
                .execute(&state.pool)
                .await?;
            roles.push(role);

            audit(state, row.id, "role_signup", serde_json::json!({ "role": role })).await;

            let user = build_user(row, roles)?;
            ApiResponse::success(
                "Role added",
                SignupResponse {
                    user,
                    verification_token: None,
                },
                None,
            )
        }
        None => {
            let password_hash = hash_password(&password)?;
            let id = Uuid::new_v4();

            let mut txn = state.pool.begin().await?;
            let row: UserRow = sqlx::query_as(
                r#"
                INSERT INTO users (id, email, password_hash, display_name, active_role)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, email, password_hash, display_name, active_role, email_verified, created_at
                "#,
            )
            .bind(id)
            .bind(email.trim())
            .bind(password_hash)
            .bind(display_name)
            .bind(role.as_str())
            .fetch_one(&mut *txn)
            .await?;

            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(row.id)
                .bind(role.as_str())
                .execute(&mut *txn)
                .await?;
            txn.commit().await?;

            audit(state, row.id, "user_signup", serde_json::json!({ "role": role })).await;

            let token = issue_verification_token(state, row.id)?;
            let user = build_user(row, vec![role])?;
            ApiResponse::success(
                "Account created",
                SignupResponse {
                    user,
                    verification_token: Some(token),
                },
                None,
            )
        }
    };

    Ok(resp)
}

/// Redeem the single-purpose token handed out at signup.
pub async fn verify_email(
    state: &AppState,
    payload: VerifyEmailRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let decoded = jsonwebtoken::decode::<VerifyEmailClaims>(
        &payload.token,
        &state.jwt.decoding,
        &Validation::default(),
    )
    .map_err(|_| AppError::Validation("invalid or expired verification token".into()))?;

    if decoded.claims.purpose != VERIFY_EMAIL_PURPOSE {
        return Err(AppError::Validation("wrong token purpose".into()));
    }

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Validation("invalid verification token subject".into()))?;

    let result = sqlx::query("UPDATE users SET email_verified = true WHERE id = $1")
        .bind(user_id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::UserNotFound);
    }

    audit(state, user_id, "email_verified", serde_json::json!({})).await;

    Ok(ApiResponse::success(
        "Email verified",
        serde_json::json!({ "verified": true }),
        Some(Meta::empty()),
    ))
}

/// Log in under a specific role. The failure modes are distinct so the
/// client can route the user: unknown email, wrong password, account
/// without that role, and unverified email are all different outcomes.
pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<SessionResponse>> {
    let LoginRequest {
        email,
        password,
        role,
    } = payload;

    let row = fetch_user_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    verify_password(&password, &row.password_hash)?;

    let roles = fetch_roles(&state.pool, row.id).await?;
    if !roles.contains(&role) {
        return Err(AppError::RoleNotFound(role));
    }

    if !row.email_verified {
        return Err(AppError::EmailNotVerified);
    }

    sqlx::query("UPDATE users SET active_role = $2 WHERE id = $1")
        .bind(row.id)
        .bind(role.as_str())
        .execute(&state.pool)
        .await?;

    let token = issue_session_token(state, row.id, role)?;

    audit(state, row.id, "user_login", serde_json::json!({ "role": role })).await;

    let mut user = build_user(row, roles)?;
    user.active_role = role;

    Ok(ApiResponse::success(
        "Logged in",
        SessionResponse { token, user },
        Some(Meta::empty()),
    ))
}

pub async fn list_roles(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<RoleList>> {
    let roles = fetch_roles(&state.pool, user.user_id).await?;
    Ok(ApiResponse::success("Roles", RoleList { roles }, None))
}

/// Switch the active role without re-authenticating. The requested
/// role must already be held; on success the credential is reissued
/// with the new active-role claim and the held set is untouched.
pub async fn switch_role(
    state: &AppState,
    user: &AuthUser,
    payload: SwitchRoleRequest,
) -> AppResult<ApiResponse<SessionResponse>> {
    let row = fetch_user_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let roles = fetch_roles(&state.pool, row.id).await?;
    if !roles.contains(&payload.role) {
        return Err(AppError::RoleNotHeld(payload.role));
    }

    sqlx::query("UPDATE users SET active_role = $2 WHERE id = $1")
        .bind(row.id)
        .bind(payload.role.as_str())
        .execute(&state.pool)
        .await?;

    let token = issue_session_token(state, row.id, payload.role)?;

    audit(
        state,
        row.id,
        "switch_role",
        serde_json::json!({ "role": payload.role }),
    )
    .await;

    let mut user = build_user(row, roles)?;
    user.active_role = payload.role;

    Ok(ApiResponse::success(
        "Role switched",
        SessionResponse { token, user },
        Some(Meta::empty()),
    ))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let row = fetch_user_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    let roles = fetch_roles(&state.pool, row.id).await?;
    let mut profile = build_user(row, roles)?;
    // The token claim is authoritative for the current session.
    profile.active_role = user.role;
    Ok(ApiResponse::success("Profile", profile, None))
}

async fn fetch_user_by_email(pool: &crate::db::DbPool, email: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, password_hash, display_name, active_role, email_verified, created_at
         FROM users WHERE email = $1",
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

async fn fetch_user_by_id(pool: &crate::db::DbPool, id: Uuid) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, password_hash, display_name, active_role, email_verified, created_at
         FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

async fn fetch_roles(pool: &crate::db::DbPool, user_id: Uuid) -> AppResult<Vec<Role>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    rows.into_iter()
        .map(|(r,)| {
            r.parse::<Role>()
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
        })
        .collect()
}

fn build_user(row: UserRow, roles: Vec<Role>) -> AppResult<User> {
    let active_role = row
        .active_role
        .parse::<Role>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(User {
        id: row.id,
        email: row.email,
        display_name: row.display_name,
        roles,
        active_role,
        email_verified: row.email_verified,
        created_at: row.created_at,
    })
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored_hash: &str) -> AppResult<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("invalid stored password hash")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthenticated)
}

fn issue_session_token(state: &AppState, user_id: Uuid, role: Role) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(SESSION_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &state.jwt.encoding)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn issue_verification_token(state: &AppState, user_id: Uuid) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(48))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("failed to set expiration")))?;

    let claims = VerifyEmailClaims {
        sub: user_id.to_string(),
        purpose: VERIFY_EMAIL_PURPOSE.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &state.jwt.encoding)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

async fn audit(state: &AppState, user_id: Uuid, action: &str, metadata: serde_json::Value) {
    let entry = AuditEntry {
        user_id: Some(user_id),
        action,
        resource: "users",
        metadata,
    };
    if let Err(err) = entry.record(&state.pool).await {
        tracing::warn!(error = %err, "audit log failed");
    }
}
