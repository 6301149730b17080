use async_trait::async_trait;

use crate::error::AppError;
use crate::projection::Column;
use crate::types::{CreateMessage, Message, MessageId, MessageRow, MessageVersion, ModifyMessage};

/// Column selection and pagination forwarded to storage by a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageQuery {
    pub columns: Vec<Column>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Storage contract the messages service depends on.
///
/// Implementations wrap their own failures as internal [`AppError`]s
/// labelled with the failing operation. A missing id is reported as an
/// internal error whose cause is an
/// [`IdMissingError`](crate::error::IdMissingError).
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a message with version 1 and `updated_at = created_at`.
    ///
    /// Fails unless exactly one row was inserted.
    async fn create(&self, message: &CreateMessage) -> Result<MessageId, AppError>;

    async fn get_by_id(&self, id: MessageId) -> Result<Message, AppError>;

    /// Replace the content, increment the version and touch `updated_at`,
    /// all in one atomic step. Returns the new version.
    async fn update_by_id(
        &self,
        id: MessageId,
        message: &ModifyMessage,
    ) -> Result<MessageVersion, AppError>;

    /// Fails unless exactly one row was deleted.
    async fn delete_by_id(&self, id: MessageId) -> Result<(), AppError>;

    /// Fetch the selected columns ordered by id. An offset past the end
    /// yields an empty result.
    async fn get_all_query(&self, query: &StorageQuery) -> Result<Vec<MessageRow>, AppError>;

    /// Cheap connectivity check for health endpoints.
    async fn ping(&self) -> Result<(), AppError>;
}
