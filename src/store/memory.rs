use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NewUser, Store, StoreError, StoreResult};
use crate::utils::time::now_rfc3339;
use crate::web::note::{Note, NoteFC};
use crate::web::user::User;

#[derive(Default)]
struct Tables {
    users: BTreeMap<String, User>, // keyed by username
    notes: BTreeMap<i64, Note>,
    last_user_id: i64,
    last_note_id: i64,
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a note as-is, bypassing id assignment. Used to seed fixtures.
    pub async fn insert_note(&self, note: Note) {
        let mut tables = self.tables.write().await;
        tables.last_note_id = tables.last_note_id.max(note.id);
        tables.notes.insert(note.id, note);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&new_user.username) {
            return Err(StoreError::Duplicate(new_user.username));
        }
        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: new_user.username,
            email: new_user.email,
            hashed_password: new_user.hashed_password,
        };
        tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(username).cloned())
    }

    async fn create_note(&self, owner_id: i64, note_fc: NoteFC) -> StoreResult<Note> {
        let mut tables = self.tables.write().await;
        tables.last_note_id += 1;
        let now = now_rfc3339();
        let note = Note {
            id: tables.last_note_id,
            content: note_fc.content,
            is_completed: note_fc.is_completed,
            tags: note_fc.tags,
            user_id: Some(owner_id),
            created_at: now.clone(),
            updated_at: now,
        };
        tables.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn list_notes(&self, owner_id: i64) -> StoreResult<Vec<Note>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .values()
            .filter(|note| note.user_id == Some(owner_id))
            .cloned()
            .collect())
    }

    async fn get_note(&self, id: i64) -> StoreResult<Option<Note>> {
        Ok(self.tables.read().await.notes.get(&id).cloned())
    }

    async fn update_note(&self, note: Note) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.notes.get_mut(&note.id) {
            *existing = note;
        }
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> StoreResult<()> {
        self.tables.write().await.notes.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            hashed_password: "hash".to_string(),
        }
    }

    fn note_fc(content: &str) -> NoteFC {
        NoteFC {
            content: content.to_string(),
            is_completed: false,
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_usernames_are_unique() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        assert_eq!(alice.id, 1);

        let dup = store.create_user(new_user("alice")).await;
        assert!(matches!(dup, Err(StoreError::Duplicate(name)) if name == "alice"));

        let bob = store.create_user(new_user("bob")).await.unwrap();
        assert_eq!(bob.id, 2);
    }

    #[tokio::test]
    async fn test_list_notes_filters_by_owner_in_id_order() {
        let store = MemoryStore::new();
        store.create_note(1, note_fc("First")).await.unwrap();
        store.create_note(2, note_fc("Other")).await.unwrap();
        store.create_note(1, note_fc("Second")).await.unwrap();

        let notes = store.list_notes(1).await.unwrap();
        let contents: Vec<&str> = notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["First", "Second"]);
        assert!(notes[0].id < notes[1].id);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let mut note = store.create_note(1, note_fc("Draft")).await.unwrap();

        note.content = "Final".to_string();
        store.update_note(note.clone()).await.unwrap();
        assert_eq!(store.get_note(note.id).await.unwrap().unwrap().content, "Final");

        store.delete_note(note.id).await.unwrap();
        assert!(store.get_note(note.id).await.unwrap().is_none());

        // Deleting again is a no-op.
        store.delete_note(note.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_ids_do_not_repeat_after_delete() {
        let store = MemoryStore::new();
        let first = store.create_note(1, note_fc("a")).await.unwrap();
        store.delete_note(first.id).await.unwrap();
        let second = store.create_note(1, note_fc("b")).await.unwrap();
        assert!(second.id > first.id);
    }
}
