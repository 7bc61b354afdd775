//! Persistence for users and notes.
//!
//! Handlers only see [`Store`]. [`MemoryStore`] backs local runs and tests,
//! [`DynamoStore`] is used when a DynamoDB table is configured.

use async_trait::async_trait;
use thiserror::Error;

use crate::web::note::{Note, NoteFC};
use crate::web::user::User;

mod dynamo;
mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Fields of a user that the caller provides; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the username is taken.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn create_note(&self, owner_id: i64, note_fc: NoteFC) -> StoreResult<Note>;

    /// Notes owned by `owner_id`, ascending by id.
    async fn list_notes(&self, owner_id: i64) -> StoreResult<Vec<Note>>;

    async fn get_note(&self, id: i64) -> StoreResult<Option<Note>>;

    /// Replaces the stored note with the same id.
    async fn update_note(&self, note: Note) -> StoreResult<()>;

    async fn delete_note(&self, id: i64) -> StoreResult<()>;
}
