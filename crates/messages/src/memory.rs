//! In-process message repository.
//!
//! Same contract as the PostgreSQL repository, backed by a `BTreeMap`
//! behind a tokio `RwLock`. Ids are never reused after a delete.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;

use crate::error::{AppError, IdMissingError};
use crate::projection::Column;
use crate::repository::{MessageRepository, StorageQuery};
use crate::types::{
    now_utc, CreateMessage, Message, MessageId, MessageRow, MessageVersion, ModifyMessage,
};

const REPO: &str = "InMemoryMessagesRepository";

#[derive(Debug)]
struct Inner {
    next_id: MessageId,
    rows: BTreeMap<MessageId, Message>,
}

#[derive(Debug, Clone)]
pub struct InMemoryMessageRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_id: 1,
                rows: BTreeMap::new(),
            })),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.rows.is_empty()
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn id_missing(op: &'static str, id: MessageId) -> AppError {
    AppError::internal(op).with_source(IdMissingError::new(op, id))
}

fn select_columns(message: &Message, columns: &[Column]) -> MessageRow {
    let mut row = MessageRow::default();
    for column in columns {
        match column {
            Column::Id => row.id = Some(message.id),
            Column::Version => row.version = Some(message.version),
            Column::CreatedAt => row.created_at = Some(message.created_at),
            Column::UpdatedAt => row.updated_at = Some(message.updated_at),
            Column::Message => row.message = Some(message.message.clone()),
        }
    }
    row
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: &CreateMessage) -> Result<MessageId, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.rows.insert(
            id,
            Message {
                id,
                version: 1,
                created_at: message.created_at,
                updated_at: message.created_at,
                message: message.message.clone(),
            },
        );
        Ok(id)
    }

    async fn get_by_id(&self, id: MessageId) -> Result<Message, AppError> {
        const OP: &str = "InMemoryMessagesRepository.GetById";
        let inner = self.inner.read().await;
        inner.rows.get(&id).cloned().ok_or_else(|| id_missing(OP, id))
    }

    async fn update_by_id(
        &self,
        id: MessageId,
        message: &ModifyMessage,
    ) -> Result<MessageVersion, AppError> {
        const OP: &str = "InMemoryMessagesRepository.UpdateById";
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id).ok_or_else(|| id_missing(OP, id))?;
        row.version += 1;
        row.updated_at = now_utc().max(row.updated_at + Duration::milliseconds(1));
        row.message = message.message.clone();
        Ok(row.version)
    }

    async fn delete_by_id(&self, id: MessageId) -> Result<(), AppError> {
        const OP: &str = "InMemoryMessagesRepository.DeleteById";
        let mut inner = self.inner.write().await;
        match inner.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(id_missing(OP, id)),
        }
    }

    async fn get_all_query(&self, query: &StorageQuery) -> Result<Vec<MessageRow>, AppError> {
        let inner = self.inner.read().await;
        let columns: &[Column] = if query.columns.is_empty() {
            &Column::ALL
        } else {
            &query.columns
        };
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(inner
            .rows
            .values()
            .skip(offset)
            .take(limit)
            .map(|m| select_columns(m, columns))
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        tracing::trace!(repo = REPO, "ping");
        Ok(())
    }
}
