use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::auth::TokenKeys;
use crate::logging::log_request;
use crate::store::Store;

pub mod docs;
pub mod extract;
pub mod health;
pub mod note;
pub mod user;

/// Shared by every route through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenKeys) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(docs::router())
        .nest("/auth", user::router(state.clone()))
        .nest("/notes", note::router(state))
        .layer(middleware::from_fn(log_request))
}
