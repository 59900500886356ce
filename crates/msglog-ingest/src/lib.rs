//! Message creation pipeline for msglog.
//!
//! Every new message enters the log through [`IngestPipeline::create_message`],
//! which runs, in order and fail-fast:
//!
//! 1. validation of the type, date-time and attachment names,
//! 2. decoding of attachment payloads (and media data),
//! 3. ID allocation, append and snapshot rewrite in one critical section,
//! 4. attachment file writes,
//! 5. live push to subscribers, released in ID order.
//!
//! Steps 1 and 2 touch no state, so a rejected request leaves nothing behind.
//! Between steps 3 and 4 the message is durable while its attachment files
//! are not yet written; that window is accepted rather than made atomic.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use msglog_fabric::Broadcaster;
//! use msglog_ingest::IngestPipeline;
//! use msglog_store::{AttachmentStore, MessageStore};
//! use msglog_types::NewMessage;
//!
//! let pipeline = IngestPipeline::new(
//!     Arc::new(MessageStore::in_memory()),
//!     Arc::new(AttachmentStore::new(std::env::temp_dir().join("msglog-doc"))),
//!     Arc::new(Broadcaster::default()),
//! );
//! let message = pipeline.create_message(NewMessage::text("hello")).unwrap();
//! assert_eq!(message.id.get(), 1);
//! ```

pub mod error;
pub mod pipeline;
pub mod sequencer;
pub mod validate;

pub use error::{ErrorKind, IngestError, IngestResult};
pub use pipeline::IngestPipeline;
pub use sequencer::PublishSequencer;
pub use validate::{validate, DecodedAttachment, ValidatedMessage};
