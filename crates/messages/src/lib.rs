//! Core domain for the messages REST API.
//!
//! The service layer ([`service::MessagesService`]) depends only on the
//! [`repository::MessageRepository`] trait; [`db`] provides the PostgreSQL
//! implementation and [`memory`] an in-process one.

pub mod db;
pub mod error;
pub mod memory;
pub mod palindrome;
pub mod projection;
pub mod repository;
pub mod service;
pub mod test_helpers;
pub mod types;
pub mod validation;

pub use error::{AppError, ErrorKind, ErrorResponse, IdMissingError};
pub use service::MessagesService;
pub use types::{Message, MessageDetail, MessageId, MessageQuery, MessageVersion, ModifyMessage};
