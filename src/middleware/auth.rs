use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use jsonwebtoken::{Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, roles::Role, state::JwtKeys};

/// Proven caller identity: user id plus the active role extracted from
/// the token claims. Attached to the request by the extractor below;
/// handlers never re-verify the credential.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// Role guard: the caller's active role must be in the whitelist for
/// the requested operation.
pub fn ensure_any_role(user: &AuthUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

pub fn ensure_vendor(user: &AuthUser) -> Result<(), AppError> {
    ensure_any_role(user, &[Role::Vendor])
}

pub fn ensure_customer(user: &AuthUser) -> Result<(), AppError> {
    ensure_any_role(user, &[Role::Customer, Role::B2bCustomer])
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthenticated)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthenticated)?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthenticated);
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let keys = JwtKeys::from_ref(state);
        let decoded = decode::<Claims>(token, &keys.decoding, &Validation::default())
            .map_err(|_| AppError::Unauthenticated)?;

        let user_id =
            Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthenticated)?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::from_u128(1),
            role,
        }
    }

    #[test]
    fn whitelist_admits_only_listed_roles() {
        assert!(ensure_vendor(&user(Role::Vendor)).is_ok());
        assert!(ensure_vendor(&user(Role::Customer)).is_err());

        assert!(ensure_customer(&user(Role::Customer)).is_ok());
        assert!(ensure_customer(&user(Role::B2bCustomer)).is_ok());
        assert!(matches!(
            ensure_customer(&user(Role::Vendor)),
            Err(AppError::Forbidden)
        ));
    }
}
