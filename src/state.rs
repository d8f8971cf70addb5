use axum::extract::FromRef;
use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::db::{DbPool, OrmConn};

/// Signing material for bearer tokens. Held in state so handlers and
/// extractors never reach for ambient process environment.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jwt: JwtKeys,
}
