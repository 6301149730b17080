//! Application error model.
//!
//! Every failure that crosses a layer boundary is an [`AppError`]: a kind,
//! the operation label of the call site that produced it, an optional
//! wrapped cause and the user-facing responses that may be returned to the
//! caller. Only [`ErrorKind::Invalid`] errors ever expose their responses.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::MessageId;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Classification of an application error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied bad input. Safe to describe to the caller.
    Invalid,
    /// The addressed entity does not exist. Signalled by status code only.
    NotFound,
    /// Anything else. Logged server side, never described to the caller.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Invalid => write!(f, "invalid"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// A single user-facing error entry, collected under `errors` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorResponse {
    /// An error scoped to one input field.
    Field { field: String, error: String },
    /// A general error message.
    Message { error: String },
}

impl ErrorResponse {
    pub fn field(field: impl Into<String>, error: impl Into<String>) -> Self {
        ErrorResponse::Field {
            field: field.into(),
            error: error.into(),
        }
    }

    pub fn message(error: impl Into<String>) -> Self {
        ErrorResponse::Message {
            error: error.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    errors: &'a [ErrorResponse],
}

/// The primary application error.
#[derive(Debug, Error)]
#[error("Error [{kind}] ({op}): {}", cause_text(.source))]
pub struct AppError {
    kind: ErrorKind,
    op: &'static str,
    #[source]
    source: Option<BoxError>,
    responses: Vec<ErrorResponse>,
    /// Captured where an internal error is created. Honours
    /// `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`.
    stack: Option<Box<Backtrace>>,
}

fn cause_text(source: &Option<BoxError>) -> String {
    source.as_ref().map(|e| e.to_string()).unwrap_or_default()
}

impl AppError {
    pub fn new(kind: ErrorKind, op: &'static str) -> Self {
        Self {
            kind,
            op,
            source: None,
            responses: Vec::new(),
            stack: (kind == ErrorKind::Internal).then(|| Box::new(Backtrace::capture())),
        }
    }

    pub fn invalid(op: &'static str) -> Self {
        Self::new(ErrorKind::Invalid, op)
    }

    pub fn not_found(op: &'static str) -> Self {
        Self::new(ErrorKind::NotFound, op)
    }

    pub fn internal(op: &'static str) -> Self {
        Self::new(ErrorKind::Internal, op)
    }

    /// Attach the underlying cause. The cause stays reachable through
    /// [`StdError::source`] and [`AppError::find_cause`].
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_response(mut self, response: ErrorResponse) -> Self {
        self.add_response(response);
        self
    }

    pub fn add_response(&mut self, response: ErrorResponse) {
        self.responses.push(response);
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn responses(&self) -> &[ErrorResponse] {
        &self.responses
    }

    /// Stack of the call site that created an internal error, when
    /// backtraces are enabled.
    pub fn stack(&self) -> Option<&Backtrace> {
        self.stack
            .as_deref()
            .filter(|bt| bt.status() == BacktraceStatus::Captured)
    }

    /// HTTP status code for this error: 400 for invalid, 404 for not found,
    /// 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ErrorKind::Invalid => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Whether this error carries a body that may be shown to the caller.
    ///
    /// Only invalid errors qualify; responses attached to any other kind
    /// are never exposed.
    pub fn has_response(&self) -> bool {
        self.kind == ErrorKind::Invalid && !self.responses.is_empty()
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }

    /// Encode the responses as `{"errors":[...]}`.
    pub fn to_json(&self) -> Result<String, ToJsonError> {
        if self.kind != ErrorKind::Invalid {
            return Err(ToJsonError::NotInvalid(self.kind));
        }
        Ok(serde_json::to_string(&ErrorBody {
            errors: &self.responses,
        })?)
    }

    /// Find the first error of type `T` in the cause chain, skipping `self`.
    pub fn find_cause<T: StdError + 'static>(&self) -> Option<&T> {
        let mut next = StdError::source(self);
        while let Some(err) = next {
            if let Some(found) = err.downcast_ref::<T>() {
                return Some(found);
            }
            next = err.source();
        }
        None
    }

    pub fn cause_is<T: StdError + 'static>(&self) -> bool {
        self.find_cause::<T>().is_some()
    }

    /// Whether storage reported that the addressed id does not exist.
    pub fn is_id_missing(&self) -> bool {
        self.cause_is::<IdMissingError>()
    }

    /// Render the full cause chain on one line for logging.
    pub fn cause_chain(&self) -> String {
        let mut out = Vec::new();
        let mut next = StdError::source(self);
        while let Some(err) = next {
            out.push(err.to_string());
            next = err.source();
        }
        out.join(" <- ")
    }
}

/// Storage reported zero matching rows for an id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op}: no row in result with id {id}")]
pub struct IdMissingError {
    pub op: &'static str,
    pub id: MessageId,
}

impl IdMissingError {
    pub fn new(op: &'static str, id: MessageId) -> Self {
        Self { op, id }
    }
}

/// Errors from [`to_json`].
#[derive(Debug, Error)]
pub enum ToJsonError {
    #[error("error type for JSON, expected invalid, but was {0}")]
    NotInvalid(ErrorKind),

    #[error("error is not an application error: {0}")]
    NotApplicationError(String),

    #[error("failed to encode error response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Structural is-a check: returns the error as an [`AppError`] when it is
/// one of ours.
pub fn as_app_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a AppError> {
    err.downcast_ref::<AppError>()
}

pub fn is_app_error(err: &(dyn StdError + 'static)) -> bool {
    as_app_error(err).is_some()
}

/// Status code for any error. Foreign errors are always 500.
pub fn status_code(err: &(dyn StdError + 'static)) -> u16 {
    as_app_error(err).map_or(500, AppError::status_code)
}

/// Whether any error has a body for the caller. Foreign errors never do.
pub fn has_response(err: &(dyn StdError + 'static)) -> bool {
    as_app_error(err).is_some_and(AppError::has_response)
}

/// Whether any error must be treated as internal. Foreign errors always are.
pub fn is_internal(err: &(dyn StdError + 'static)) -> bool {
    as_app_error(err).map_or(true, AppError::is_internal)
}

/// Encode any error as `{"errors":[...]}`. Check [`has_response`] first.
pub fn to_json(err: &(dyn StdError + 'static)) -> Result<String, ToJsonError> {
    match as_app_error(err) {
        Some(app) => app.to_json(),
        None => Err(ToJsonError::NotApplicationError(err.to_string())),
    }
}
