//! Durable storage for msglog.
//!
//! Two stores live here:
//!
//! - [`MessageStore`] -- the append-only, ID-ordered message log. It owns ID
//!   allocation and rewrites its whole snapshot after every append.
//! - [`AttachmentStore`] -- raw attachment bytes laid out as
//!   `<root>/<message id>/<attachment name>`.
//!
//! # Snapshot Backends
//!
//! The message log persists through the [`SnapshotBackend`] trait:
//!
//! - [`JsonFileSnapshot`] -- a single JSON array file, rewritten wholesale
//! - [`InMemorySnapshot`] -- keeps the last saved snapshot in memory, for tests
//!   and embedding
//!
//! # Design Rules
//!
//! 1. Messages are immutable once appended; the log is never truncated.
//! 2. ID allocation, append, and snapshot rewrite share one critical section.
//! 3. Readers see a message either fully or not at all.
//! 4. A snapshot that exists but cannot be parsed is fatal at load time.
//! 5. A failed snapshot write is reported; the in-memory append is kept.
//! 6. Attachment writes happen outside the message log lock.

pub mod attachment;
pub mod error;
pub mod memory;
pub mod message_store;
pub mod snapshot;

pub use attachment::{decode_payload, AttachmentStore};
pub use error::{StoreError, StoreResult};
pub use memory::InMemorySnapshot;
pub use message_store::MessageStore;
pub use snapshot::{JsonFileSnapshot, SnapshotBackend};
