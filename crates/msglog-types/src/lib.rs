//! Foundation types for msglog.
//!
//! This crate provides the value types shared by every other msglog crate.
//! It performs no I/O.
//!
//! # Key Types
//!
//! - [`Message`]: An immutable entry in the append-only message log
//! - [`MessageId`]: Positive, monotonically allocated message identifier
//! - [`MessageType`]: Payload kind: text, audio, or video
//! - [`MessageTimestamp`]: Creation time, serialized as `DD-MM-YYYY HH:MM:SS`
//! - [`NewMessage`]: An unvalidated creation request as received from a client
//! - [`AttachmentName`]: A validated, filesystem-safe attachment name
//! - [`PageQuery`] / [`MessagesPage`]: Feed retrieval request and response

pub mod attachment;
pub mod error;
pub mod id;
pub mod message;
pub mod page;
pub mod temporal;

pub use attachment::{AttachmentName, RawAttachment};
pub use error::TypeError;
pub use id::MessageId;
pub use message::{Message, MessageType, NewMessage};
pub use page::{MessagesPage, PageQuery};
pub use temporal::{DateTimeInput, MessageTimestamp, DATE_TIME_FORMAT};
