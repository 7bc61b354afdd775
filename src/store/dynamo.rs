use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use serde::{Deserialize, Serialize};
use serde_dynamo::{from_item, from_items, to_item};

use super::{NewUser, Store, StoreError, StoreResult};
use crate::utils::time::now_rfc3339;
use crate::web::note::{Note, NoteFC};
use crate::web::user::User;

const NOTE_PK: &str = "Note";
const USER_PK: &str = "User";
const COUNTER_PK: &str = "Counter";

/// Global secondary index: partition key `owner`, sort key `sk`.
pub const OWNER_INDEX: &str = "owner-index";

type Item = HashMap<String, AttributeValue>;

/// Single-table layout:
///
/// | pk        | sk                        |
/// |-----------|---------------------------|
/// | "Note"    | id, zero padded to 19     |
/// | "User"    | username                  |
/// | "Counter" | "Note" / "User"           |
///
/// Note items also carry `owner` ("User::<id>"), the partition key of
/// [`OWNER_INDEX`], so listing reads only the caller's notes.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct NoteItem {
    pk: String, // always "Note"
    sk: String, // e.g. "0000000000000000042"
    id: i64,
    content: String,
    is_completed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tags: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<String>, // e.g. "User::3"

    created_at: String,
    updated_at: String,
}

impl From<Note> for NoteItem {
    fn from(note: Note) -> Self {
        Self {
            pk: NOTE_PK.to_string(),
            sk: note_sk(note.id),
            id: note.id,
            content: note.content,
            is_completed: note.is_completed,
            tags: note.tags,
            user_id: note.user_id,
            owner: note.user_id.map(owner_key),
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

impl From<NoteItem> for Note {
    fn from(item: NoteItem) -> Self {
        Self {
            id: item.id,
            content: item.content,
            is_completed: item.is_completed,
            tags: item.tags,
            user_id: item.user_id,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct UserItem {
    pk: String, // always "User"
    sk: String, // username
    id: i64,
    username: String,
    email: String,
    hashed_password: String,
}

impl From<User> for UserItem {
    fn from(user: User) -> Self {
        Self {
            pk: USER_PK.to_string(),
            sk: user.username.clone(),
            id: user.id,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
        }
    }
}

impl From<UserItem> for User {
    fn from(item: UserItem) -> Self {
        Self {
            id: item.id,
            username: item.username,
            email: item.email,
            hashed_password: item.hashed_password,
        }
    }
}

fn owner_key(user_id: i64) -> String {
    format!("{}::{}", USER_PK, user_id)
}

/// Sort keys compare as strings, so ids are padded to keep numeric order.
fn note_sk(id: i64) -> String {
    format!("{:019}", id)
}

impl DynamoStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Builds a client from the default AWS credential/region chain.
    pub async fn from_env(table_name: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), table_name)
    }

    async fn ddb_next_id(&self, counter: &str) -> StoreResult<i64> {
        let res = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("pk", AttributeValue::S(COUNTER_PK.to_string()))
            .key("sk", AttributeValue::S(counter.to_string()))
            .update_expression("ADD #value :one")
            .expression_attribute_names("#value", "value")
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .with_context(|| format!("incrementing {} counter", counter))?;

        let value = res
            .attributes()
            .and_then(|attrs| attrs.get("value"))
            .and_then(|v| v.as_n().ok())
            .ok_or_else(|| anyhow::anyhow!("{} counter returned no value", counter))?;
        let id = value
            .parse::<i64>()
            .with_context(|| format!("parsing {} counter value {:?}", counter, value))?;
        Ok(id)
    }

    async fn ddb_put_note(&self, note: Note, must_exist: bool) -> StoreResult<()> {
        let item: Item = to_item(NoteItem::from(note)).context("serializing note")?;
        let mut req = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item));
        if must_exist {
            req = req.condition_expression("attribute_exists(pk)");
        }

        match req.send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .map_or(false, |e| e.is_conditional_check_failed_exception()) =>
            {
                Ok(())
            }
            Err(err) => Err(anyhow::Error::from(err).context("putting note").into()),
        }
    }
}

#[async_trait]
impl Store for DynamoStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let id = self.ddb_next_id(USER_PK).await?;
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            hashed_password: new_user.hashed_password,
        };
        let item: Item = to_item(UserItem::from(user.clone())).context("serializing user")?;

        let res = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(pk)")
            .send()
            .await;

        match res {
            Ok(_) => Ok(user),
            Err(err)
                if err
                    .as_service_error()
                    .map_or(false, |e| e.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::Duplicate(user.username))
            }
            Err(err) => Err(anyhow::Error::from(err).context("creating user").into()),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let res = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("pk", AttributeValue::S(USER_PK.to_string()))
            .key("sk", AttributeValue::S(username.to_string()))
            .send()
            .await
            .context("getting user")?;

        match res.item {
            Some(item) => {
                let user: UserItem = from_item(item).context("deserializing user")?;
                Ok(Some(user.into()))
            }
            None => Ok(None),
        }
    }

    async fn create_note(&self, owner_id: i64, note_fc: NoteFC) -> StoreResult<Note> {
        let id = self.ddb_next_id(NOTE_PK).await?;
        let now = now_rfc3339();
        let note = Note {
            id,
            content: note_fc.content,
            is_completed: note_fc.is_completed,
            tags: note_fc.tags,
            user_id: Some(owner_id),
            created_at: now.clone(),
            updated_at: now,
        };
        self.ddb_put_note(note.clone(), false).await?;
        Ok(note)
    }

    async fn list_notes(&self, owner_id: i64) -> StoreResult<Vec<Note>> {
        let mut notes: Vec<Note> = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let res = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(OWNER_INDEX)
                .key_condition_expression("#owner = :owner")
                .expression_attribute_names("#owner", "owner")
                .expression_attribute_values(":owner", AttributeValue::S(owner_key(owner_id)))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .context("querying notes")?;

            if let Some(items) = res.items {
                let page: Vec<NoteItem> = from_items(items).context("deserializing notes")?;
                notes.extend(page.into_iter().map(Note::from));
            }

            match res.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(notes)
    }

    async fn get_note(&self, id: i64) -> StoreResult<Option<Note>> {
        let res = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("pk", AttributeValue::S(NOTE_PK.to_string()))
            .key("sk", AttributeValue::S(note_sk(id)))
            .send()
            .await
            .context("getting note")?;

        match res.item {
            Some(item) => {
                let note: NoteItem = from_item(item).context("deserializing note")?;
                Ok(Some(note.into()))
            }
            None => Ok(None),
        }
    }

    async fn update_note(&self, note: Note) -> StoreResult<()> {
        self.ddb_put_note(note, true).await
    }

    async fn delete_note(&self, id: i64) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("pk", AttributeValue::S(NOTE_PK.to_string()))
            .key("sk", AttributeValue::S(note_sk(id)))
            .send()
            .await
            .context("deleting note")?;
        Ok(())
    }
}
