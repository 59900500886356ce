use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a message in the log.
///
/// IDs are allocated by the message store as `max existing id + 1` and are
/// never reused. Serialized as a bare JSON number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Wrap a raw numeric ID.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The ID that follows this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for MessageId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
