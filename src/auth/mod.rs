//! Password hashing, access tokens and the [`AuthUser`] extractor.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::web::user::User;
use crate::web::AppState;
use crate::{AError, AResult};

pub mod password;
pub mod token;

pub use password::{hash_password, verify_dummy, verify_password};
pub use token::{Claims, TokenError, TokenKeys};

const NOT_AUTHENTICATED: &str = "Not authenticated";
const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// The caller, resolved from an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> AResult<Self> {
        let state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("AppState extension missing"))?;

        let token = bearer_token(parts).ok_or_else(|| AError::unauthorized(NOT_AUTHENTICATED))?;

        let claims = state.tokens.verify(token).map_err(|err| {
            tracing::debug!(%err, "rejected access token");
            AError::unauthorized(INVALID_CREDENTIALS)
        })?;

        let user = state
            .store
            .find_user_by_username(&claims.sub)
            .await?
            .filter(|user| user.id == claims.uid)
            .ok_or_else(|| AError::unauthorized(INVALID_CREDENTIALS))?;

        Ok(AuthUser(user))
    }
}
