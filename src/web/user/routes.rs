use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tokio::task::spawn_blocking;

use super::model::{normalize_username, LoginFC, Token, UserFC, UserPublic};
use crate::auth::{hash_password, verify_dummy, verify_password, AuthUser};
use crate::store::{NewUser, StoreError};
use crate::web::docs::ErrorBody;
use crate::web::extract::ApiJson;
use crate::web::AppState;
use crate::{AError, AResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .layer(Extension(state))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = UserFC,
    responses(
        (status = 201, description = "Account created", body = UserPublic),
        (status = 409, description = "Username taken", body = ErrorBody),
        (status = 422, description = "Invalid body", body = ErrorBody)
    )
)]
pub async fn register(
    Extension(state): Extension<AppState>,
    ApiJson(payload): ApiJson<UserFC>,
) -> AResult<(StatusCode, Json<UserPublic>)> {
    payload.validate()?;

    let password = payload.password;
    let hashed_password = spawn_blocking(move || hash_password(&password)).await??;

    let new_user = NewUser {
        username: normalize_username(&payload.username).to_string(),
        email: payload.email.trim().to_string(),
        hashed_password,
    };
    let user = match state.store.create_user(new_user).await {
        Ok(user) => user,
        Err(StoreError::Duplicate(_)) => {
            return Err(AError::conflict("Username already registered"))
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginFC,
    responses(
        (status = 200, description = "Access token", body = Token),
        (status = 401, description = "Bad credentials", body = ErrorBody)
    )
)]
pub async fn login(
    Extension(state): Extension<AppState>,
    ApiJson(payload): ApiJson<LoginFC>,
) -> AResult<Json<Token>> {
    let username = payload.username().to_string();
    let user = state.store.find_user_by_username(&username).await?;

    // Unknown usernames still pay for one argon2 verification.
    let password = payload.password;
    let hashed_password = user.as_ref().map(|user| user.hashed_password.clone());
    let valid = spawn_blocking(move || match hashed_password {
        Some(hashed_password) => verify_password(&password, &hashed_password),
        None => verify_dummy(&password),
    })
    .await?;

    let user = match user {
        Some(user) if valid => user,
        _ => {
            tracing::info!(username = %username, "login failed");
            return Err(AError::unauthorized("Incorrect username or password"));
        }
    };

    let access_token = state.tokens.issue(&user)?;
    Ok(Json(Token::bearer(access_token)))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "The caller", body = UserPublic),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn me(AuthUser(user): AuthUser) -> Json<UserPublic> {
    Json(user.into())
}
