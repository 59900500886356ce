use std::fmt;

use msglog_store::StoreError;
use msglog_types::TypeError;

/// Broad class of a creation failure, used by callers to pick a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected input; no state was touched.
    Validation,
    /// An attachment or media payload is not valid base64; nothing persisted.
    Decode,
    /// Snapshot or attachment I/O failed.
    Storage,
    /// The referenced message or attachment does not exist.
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Decode => "decode",
            Self::Storage => "storage",
            Self::NotFound => "not-found",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while creating a message.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A field failed validation.
    #[error("invalid input: {0}")]
    Invalid(#[from] TypeError),

    /// Two attachments of one message share a name.
    #[error("duplicate attachment name: {0:?}")]
    DuplicateAttachment(String),

    /// A payload is not valid base64.
    #[error("cannot decode {field}: {reason}")]
    Decode { field: String, reason: String },

    /// The message log or attachment store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) | Self::DuplicateAttachment(_) => ErrorKind::Validation,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Store(StoreError::Decode { .. }) => ErrorKind::Decode,
            Self::Store(e) if e.is_not_found() => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Storage,
        }
    }
}

/// Result alias for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;
