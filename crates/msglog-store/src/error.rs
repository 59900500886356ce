use std::path::PathBuf;

use msglog_types::MessageId;

/// Errors from message log and attachment operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No message with this ID exists.
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    /// The attachment file does not exist for this message.
    #[error("attachment {name:?} not found for message {message_id}")]
    AttachmentNotFound { message_id: MessageId, name: String },

    /// The snapshot file exists but does not hold a valid message array.
    #[error("corrupt snapshot {path}: {reason}")]
    CorruptSnapshot { path: PathBuf, reason: String },

    /// An attachment payload is not valid base64.
    #[error("attachment {name:?} is not valid base64: {reason}")]
    Decode { name: String, reason: String },

    /// An appended message does not carry an ID above the current maximum.
    #[error("message id {id} is not above the current maximum {max}")]
    IdNotIncreasing { id: MessageId, max: MessageId },

    /// Serialization failure while writing a snapshot.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot backend refuses writes.
    #[error("snapshot store is read-only")]
    ReadOnly,
}

impl StoreError {
    /// Returns `true` for the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::MessageNotFound(_) | Self::AttachmentNotFound { .. }
        )
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
