use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use msglog_types::Message;

use crate::error::{StoreError, StoreResult};
use crate::snapshot::SnapshotBackend;

/// Snapshot backend that keeps the last saved snapshot in memory.
///
/// Intended for tests and embedding. Can be switched read-only to exercise
/// snapshot write failures.
pub struct InMemorySnapshot {
    saved: RwLock<Vec<Message>>,
    saves: AtomicUsize,
    read_only: AtomicBool,
}

impl InMemorySnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::with_messages(Vec::new())
    }

    /// Create a snapshot that loads the given messages.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            saved: RwLock::new(messages),
            saves: AtomicUsize::new(0),
            read_only: AtomicBool::new(false),
        }
    }

    /// Make subsequent saves fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved snapshot.
    pub fn saved(&self) -> Vec<Message> {
        self.saved.read().expect("snapshot lock poisoned").clone()
    }
}

impl Default for InMemorySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBackend for InMemorySnapshot {
    fn load(&self) -> StoreResult<Vec<Message>> {
        Ok(self.saved())
    }

    fn save(&self, messages: &[Arc<Message>]) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        let copy = messages.iter().map(|m| Message::clone(m)).collect();
        *self.saved.write().expect("snapshot lock poisoned") = copy;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

impl std::fmt::Debug for InMemorySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySnapshot")
            .field("save_count", &self.save_count())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}
