use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub type AResult<T> = core::result::Result<T, AError>;

/// Error returned by every handler. Rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub enum AError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Validation(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl AError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound(detail.into())
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::Unauthorized(detail.into())
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden(detail.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict(detail.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AError::NotFound(_) => StatusCode::NOT_FOUND,
            AError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AError::Forbidden(_) => StatusCode::FORBIDDEN,
            AError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AError::Conflict(_) => StatusCode::CONFLICT,
            AError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &str {
        match self {
            AError::NotFound(d)
            | AError::Unauthorized(d)
            | AError::Forbidden(d)
            | AError::Validation(d)
            | AError::Conflict(d) => d,
            AError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if let AError::Internal(err) = &self {
            tracing::error!(error = ?err, "request failed");
        }
        let body = Json(json!({ "detail": self.detail() }));

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}

impl<E> From<E> for AError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AError::validation("x").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AError::conflict("x").status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_hides_cause() {
        let err: AError = anyhow::anyhow!("dynamodb exploded").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Internal server error");
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let res = AError::unauthorized("Not authenticated").into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
