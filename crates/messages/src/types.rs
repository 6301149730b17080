use std::collections::BTreeSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::palindrome::is_palindrome;

pub type MessageId = i64;
pub type MessageVersion = i32;

/// Maximum number of characters (Unicode scalar values, not bytes) in a
/// message.
pub const MAX_MESSAGE_CHAR_LENGTH: usize = 512;

/// A stored message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub version: MessageVersion,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message: String,
}

impl Message {
    pub fn is_palindrome(&self) -> bool {
        is_palindrome(&self.message)
    }
}

/// A message together with its derived fields, as returned by a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    #[serde(flatten)]
    pub message: Message,
    pub is_palindrome: bool,
}

impl From<Message> for MessageDetail {
    fn from(message: Message) -> Self {
        let is_palindrome = message.is_palindrome();
        Self {
            message,
            is_palindrome,
        }
    }
}

/// Input for create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyMessage {
    pub message: String,
}

impl ModifyMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What the repository persists on create. `created_at` also seeds
/// `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMessage {
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Input for list: requested field names plus pagination.
///
/// An empty field set means every known field. `offset` is an absolute
/// row offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQuery {
    pub fields: BTreeSet<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl MessageQuery {
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// A row returned by a projected query. Columns that were not selected are
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRow {
    pub id: Option<MessageId>,
    pub version: Option<MessageVersion>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl From<Message> for MessageRow {
    fn from(m: Message) -> Self {
        Self {
            id: Some(m.id),
            version: Some(m.version),
            created_at: Some(m.created_at),
            updated_at: Some(m.updated_at),
            message: Some(m.message),
        }
    }
}

/// A list entry shaped by the requested fields. Unrequested fields are
/// omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<MessageVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_palindrome: Option<bool>,
}

/// Current UTC time at millisecond precision.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().round_subsecs(3)
}
