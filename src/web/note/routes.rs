use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use super::model::{Note, NoteDeleted, NoteFC};
use crate::auth::AuthUser;
use crate::web::docs::ErrorBody;
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::user::User;
use crate::web::AppState;
use crate::{AError, AResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_note).get(list_notes))
        .route(
            "/:note_id",
            get(get_note).put(update_note).delete(delete_note),
        )
        .layer(Extension(state))
}

/// Loads a note and checks that `user` owns it. `action` ends up in the 403 detail.
async fn find_owned(state: &AppState, user: &User, note_id: i64, action: &str) -> AResult<Note> {
    let note = state
        .store
        .get_note(note_id)
        .await?
        .ok_or_else(|| AError::not_found("Note not found"))?;

    if note.user_id != Some(user.id) {
        tracing::info!(note_id, user_id = user.id, action, "note access denied");
        return Err(AError::forbidden(format!(
            "Not authorized to {} this note",
            action
        )));
    }
    Ok(note)
}

#[utoipa::path(
    post,
    path = "/notes",
    tag = "notes",
    request_body = NoteFC,
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 422, description = "Invalid body", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_note(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<NoteFC>,
) -> AResult<(StatusCode, Json<Note>)> {
    payload.validate()?;
    let note = state.store.create_note(user.id, payload).await?;
    tracing::info!(note_id = note.id, user_id = user.id, "note created");
    Ok((StatusCode::CREATED, Json(note)))
}

#[utoipa::path(
    get,
    path = "/notes",
    tag = "notes",
    responses(
        (status = 200, description = "Caller's notes in id order", body = [Note]),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_notes(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
) -> AResult<Json<Vec<Note>>> {
    let notes = state.store.list_notes(user.id).await?;
    Ok(Json(notes))
}

#[utoipa::path(
    get,
    path = "/notes/{note_id}",
    tag = "notes",
    params(("note_id" = i64, Path, description = "Note id")),
    responses(
        (status = 200, description = "The note", body = Note),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Owned by another user", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn get_note(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(note_id): ApiPath<i64>,
) -> AResult<Json<Note>> {
    let note = find_owned(&state, &user, note_id, "access").await?;
    Ok(Json(note))
}

#[utoipa::path(
    put,
    path = "/notes/{note_id}",
    tag = "notes",
    params(("note_id" = i64, Path, description = "Note id")),
    request_body = NoteFC,
    responses(
        (status = 200, description = "Updated note", body = Note),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Owned by another user", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody),
        (status = 422, description = "Invalid body", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_note(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(note_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<NoteFC>,
) -> AResult<Json<Note>> {
    payload.validate()?;
    let mut note = find_owned(&state, &user, note_id, "update").await?;

    note.content = payload.content;
    note.is_completed = payload.is_completed;
    note.tags = payload.tags;
    note.updated_at = crate::utils::time::now_rfc3339();

    state.store.update_note(note.clone()).await?;
    tracing::info!(note_id, user_id = user.id, "note updated");
    Ok(Json(note))
}

#[utoipa::path(
    delete,
    path = "/notes/{note_id}",
    tag = "notes",
    params(("note_id" = i64, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note deleted", body = NoteDeleted),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Owned by another user", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_note(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(note_id): ApiPath<i64>,
) -> AResult<Json<NoteDeleted>> {
    find_owned(&state, &user, note_id, "delete").await?;
    state.store.delete_note(note_id).await?;
    tracing::info!(note_id, user_id = user.id, "note deleted");
    Ok(Json(NoteDeleted::new(note_id)))
}
