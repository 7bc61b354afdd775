use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use super::note::{self, Note, NoteDeleted, NoteFC};
use super::user::{self, LoginFC, Token, UserFC, UserPublic};

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "notes-api", description = "Note-taking API with bearer-token auth"),
    paths(
        user::routes::register,
        user::routes::login,
        user::routes::me,
        note::routes::create_note,
        note::routes::list_notes,
        note::routes::get_note,
        note::routes::update_note,
        note::routes::delete_note,
    ),
    components(schemas(
        Note,
        NoteFC,
        NoteDeleted,
        UserFC,
        UserPublic,
        LoginFC,
        Token,
        ErrorBody
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Accounts and access tokens"),
        (name = "notes", description = "Notes owned by the caller")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html>
<head>
<title>notes-api - Swagger UI</title>
<meta charset="utf-8">
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
window.ui = SwaggerUIBundle({
    url: "/openapi.json",
    dom_id: "#swagger-ui",
    persistAuthorization: true
});
</script>
</body>
</html>
"##;

pub fn router() -> Router {
    Router::new()
        .route("/docs", get(swagger_ui))
        .route("/openapi.json", get(openapi_json))
}

async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
