//! Field projection for list queries.
//!
//! Callers name the fields they want. Each name resolves to either a stored
//! column, which is forwarded to the storage query, or a derived field,
//! which is computed per row after the fetch.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::error::{AppError, ErrorResponse};
use crate::palindrome::is_palindrome;
use crate::types::{MessageRow, MessageView};

/// A stored column of the `messages` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Id,
    Version,
    CreatedAt,
    UpdatedAt,
    Message,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Id,
        Column::Version,
        Column::CreatedAt,
        Column::UpdatedAt,
        Column::Message,
    ];

    /// SQL column name.
    pub fn sql_name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Version => "version",
            Column::CreatedAt => "created_at",
            Column::UpdatedAt => "updated_at",
            Column::Message => "message",
        }
    }
}

/// A field computed from stored columns, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Derived {
    IsPalindrome,
}

impl Derived {
    /// Columns that must be fetched to compute this field.
    pub fn depends_on(self) -> &'static [Column] {
        match self {
            Derived::IsPalindrome => &[Column::Message],
        }
    }
}

/// A field name a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Stored(Column),
    Derived(Derived),
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Stored(Column::Id),
        Field::Stored(Column::Version),
        Field::Stored(Column::CreatedAt),
        Field::Stored(Column::UpdatedAt),
        Field::Stored(Column::Message),
        Field::Derived(Derived::IsPalindrome),
    ];

    pub fn parse(name: &str) -> Option<Field> {
        match name {
            "id" => Some(Field::Stored(Column::Id)),
            "version" => Some(Field::Stored(Column::Version)),
            "createdAt" => Some(Field::Stored(Column::CreatedAt)),
            "updatedAt" => Some(Field::Stored(Column::UpdatedAt)),
            "message" => Some(Field::Stored(Column::Message)),
            "isPalindrome" => Some(Field::Derived(Derived::IsPalindrome)),
            _ => None,
        }
    }

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Field::Stored(Column::Id) => "id",
            Field::Stored(Column::Version) => "version",
            Field::Stored(Column::CreatedAt) => "createdAt",
            Field::Stored(Column::UpdatedAt) => "updatedAt",
            Field::Stored(Column::Message) => "message",
            Field::Derived(Derived::IsPalindrome) => "isPalindrome",
        }
    }
}

/// Requested names that matched no known field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid messages fields: {}", .0.join(", "))]
pub struct UnknownFieldsError(pub Vec<String>);

/// The resolved set of fields for one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: BTreeSet<Field>,
}

impl Projection {
    pub fn all() -> Self {
        Self {
            fields: Field::ALL.into_iter().collect(),
        }
    }

    /// Resolve requested names. No names means every field. Any unknown name
    /// rejects the whole request with one invalid error listing all of them.
    pub fn resolve(op: &'static str, requested: &BTreeSet<String>) -> Result<Self, AppError> {
        if requested.is_empty() {
            return Ok(Self::all());
        }

        let mut fields = BTreeSet::new();
        let mut unknown = Vec::new();
        for name in requested {
            match Field::parse(name) {
                Some(field) => {
                    fields.insert(field);
                }
                None => unknown.push(name.clone()),
            }
        }

        if !unknown.is_empty() {
            let err = UnknownFieldsError(unknown);
            return Err(AppError::invalid(op)
                .with_response(ErrorResponse::message(err.to_string()))
                .with_source(err));
        }

        Ok(Self { fields })
    }

    pub fn includes(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.iter().copied()
    }

    /// Columns to select: the requested stored fields plus whatever the
    /// requested derived fields need, in table order.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = BTreeSet::new();
        for field in &self.fields {
            match field {
                Field::Stored(column) => {
                    columns.insert(*column);
                }
                Field::Derived(derived) => columns.extend(derived.depends_on().iter().copied()),
            }
        }
        columns.into_iter().collect()
    }

    /// Build the response entry for one row, dropping fields that were only
    /// fetched to compute derived values.
    pub fn shape(&self, row: MessageRow) -> MessageView {
        let mut view = MessageView::default();
        for field in &self.fields {
            match field {
                Field::Stored(Column::Id) => view.id = row.id,
                Field::Stored(Column::Version) => view.version = row.version,
                Field::Stored(Column::CreatedAt) => view.created_at = row.created_at,
                Field::Stored(Column::UpdatedAt) => view.updated_at = row.updated_at,
                Field::Stored(Column::Message) => view.message = row.message.clone(),
                Field::Derived(Derived::IsPalindrome) => {
                    view.is_palindrome = row.message.as_deref().map(is_palindrome)
                }
            }
        }
        view
    }
}
