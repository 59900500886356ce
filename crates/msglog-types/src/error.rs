use thiserror::Error;

/// Errors produced while validating raw client input into typed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown message type: {0:?}")]
    UnknownMessageType(String),

    #[error("malformed date-time {value:?}: expected DD-MM-YYYY HH:MM:SS")]
    InvalidDateTime { value: String },

    #[error("epoch milliseconds out of range: {0}")]
    TimestampOutOfRange(i64),

    #[error("invalid attachment name {name:?}: {reason}")]
    InvalidAttachmentName { name: String, reason: &'static str },
}
