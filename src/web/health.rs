use axum::http::StatusCode;

/// Liveness only; does not touch the store.
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
