use std::sync::Arc;

use tracing::debug;

use crate::error::AppError;
use crate::projection::Projection;
use crate::repository::{MessageRepository, StorageQuery};
use crate::types::{
    now_utc, CreateMessage, MessageDetail, MessageId, MessageQuery, MessageVersion, MessageView,
    ModifyMessage,
};
use crate::validation::validate_message;

/// Message use cases: validation, storage calls, derived fields and error
/// classification. Holds no per-request state.
#[derive(Clone)]
pub struct MessagesService {
    repo: Arc<dyn MessageRepository>,
}

impl MessagesService {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn MessageRepository> {
        &self.repo
    }

    /// Validate and store a new message stamped with the current UTC time.
    pub async fn create(&self, candidate: &ModifyMessage) -> Result<MessageId, AppError> {
        const OP: &str = "MessagesService.Create";
        validate_message(OP, candidate)?;

        let id = self
            .repo
            .create(&CreateMessage {
                message: candidate.message.clone(),
                created_at: now_utc(),
            })
            .await?;

        debug!(id, "message created");
        Ok(id)
    }

    /// Read one message. A missing id becomes a not found error.
    pub async fn read(&self, id: MessageId) -> Result<MessageDetail, AppError> {
        const OP: &str = "MessagesService.Read";
        let message = self.repo.get_by_id(id).await.map_err(|e| {
            if e.is_id_missing() {
                AppError::not_found(OP).with_source(e)
            } else {
                e
            }
        })?;
        Ok(MessageDetail::from(message))
    }

    /// Replace the content of a message and return its new version.
    ///
    /// A missing id is returned as storage reported it; check
    /// [`AppError::is_id_missing`].
    pub async fn update(
        &self,
        id: MessageId,
        candidate: &ModifyMessage,
    ) -> Result<MessageVersion, AppError> {
        const OP: &str = "MessagesService.Update";
        validate_message(OP, candidate)?;

        let version = self.repo.update_by_id(id, candidate).await?;
        debug!(id, version, "message updated");
        Ok(version)
    }

    /// Delete a message. Deleting an id that does not exist succeeds.
    pub async fn delete(&self, id: MessageId) -> Result<(), AppError> {
        match self.repo.delete_by_id(id).await {
            Ok(()) => {
                debug!(id, "message deleted");
                Ok(())
            }
            Err(e) if e.is_id_missing() => {
                debug!(id, "delete of missing message ignored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// List messages with only the requested fields.
    pub async fn list(&self, query: &MessageQuery) -> Result<Vec<MessageView>, AppError> {
        const OP: &str = "MessagesService.List";
        let projection = Projection::resolve(OP, &query.fields)?;

        let rows = self
            .repo
            .get_all_query(&StorageQuery {
                columns: projection.columns(),
                limit: query.limit,
                offset: query.offset,
            })
            .await?;

        Ok(rows.into_iter().map(|row| projection.shape(row)).collect())
    }
}
