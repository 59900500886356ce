use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use msglog_types::{Message, MessageId};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemorySnapshot;
use crate::snapshot::{JsonFileSnapshot, SnapshotBackend};

/// Append-only message log with monotonic ID allocation.
///
/// Messages are kept oldest-first behind a `RwLock`. Every append takes the
/// write lock for the whole allocate, push and snapshot rewrite sequence, so
/// two appends never share an ID and two snapshot rewrites never interleave.
/// Readers clone `Arc`s under the read lock and never observe a partially
/// built message.
pub struct MessageStore {
    snapshot: Box<dyn SnapshotBackend>,
    state: RwLock<LogState>,
}

struct LogState {
    messages: Vec<Arc<Message>>,
    max_id: MessageId,
}

impl LogState {
    fn allocate(&mut self) -> MessageId {
        self.max_id = self.max_id.next();
        self.max_id
    }
}

impl MessageStore {
    /// Open the log backed by a JSON snapshot file at `path`.
    ///
    /// A missing file yields an empty log. A file that exists but cannot be
    /// parsed is an error.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_backend(Box::new(JsonFileSnapshot::new(path)))
    }

    /// An empty log that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            snapshot: Box::new(InMemorySnapshot::new()),
            state: RwLock::new(LogState {
                messages: Vec::new(),
                max_id: MessageId::new(0),
            }),
        }
    }

    /// Load the log from the given backend.
    ///
    /// The ID allocator is seeded from the largest ID found (0 when empty).
    pub fn with_backend(snapshot: Box<dyn SnapshotBackend>) -> StoreResult<Self> {
        let mut messages = snapshot.load()?;
        // Older snapshots were written in append order, which is ID order.
        // Sorting keeps lookups valid should a hand-edited file disagree.
        messages.sort_by_key(|m| m.id);
        let max_id = messages
            .iter()
            .map(|m| m.id)
            .max()
            .unwrap_or(MessageId::new(0));

        info!(
            backend = %snapshot.describe(),
            count = messages.len(),
            max_id = %max_id,
            "message log opened"
        );

        Ok(Self {
            snapshot,
            state: RwLock::new(LogState {
                messages: messages.into_iter().map(Arc::new).collect(),
                max_id,
            }),
        })
    }

    /// The ID the next append will receive: `max existing id + 1`.
    pub fn next_id(&self) -> MessageId {
        self.read_state().max_id.next()
    }

    /// Largest ID ever allocated or loaded (0 when empty).
    pub fn max_id(&self) -> MessageId {
        self.read_state().max_id
    }

    /// Allocate an ID, build the message, append it and rewrite the snapshot,
    /// all inside one critical section.
    ///
    /// If the snapshot write fails the message stays in memory and the error
    /// is returned; memory and disk then disagree until the next successful
    /// write.
    pub fn append_with<F>(&self, build: F) -> StoreResult<Arc<Message>>
    where
        F: FnOnce(MessageId) -> Message,
    {
        let mut state = self.write_state();
        let id = state.allocate();
        let message = build(id);
        if message.id != id {
            return Err(StoreError::IdNotIncreasing {
                id: message.id,
                max: id,
            });
        }
        self.push_and_persist(&mut state, message)
    }

    /// Append a message that already carries an ID.
    ///
    /// The ID must be greater than every ID seen so far.
    pub fn append(&self, message: Message) -> StoreResult<Arc<Message>> {
        let mut state = self.write_state();
        if message.id <= state.max_id {
            return Err(StoreError::IdNotIncreasing {
                id: message.id,
                max: state.max_id,
            });
        }
        state.max_id = message.id;
        self.push_and_persist(&mut state, message)
    }

    /// Rewrite the snapshot from the current in-memory log.
    pub fn persist(&self) -> StoreResult<()> {
        // Held for writing so a concurrent append's rewrite cannot interleave.
        let state = self.write_state();
        self.snapshot.save(&state.messages)
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> Vec<Arc<Message>> {
        self.read_state().messages.clone()
    }

    /// Look up one message by ID.
    pub fn get(&self, id: MessageId) -> StoreResult<Arc<Message>> {
        let state = self.read_state();
        state
            .messages
            .binary_search_by_key(&id, |m| m.id)
            .map(|idx| Arc::clone(&state.messages[idx]))
            .map_err(|_| StoreError::MessageNotFound(id))
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.read_state().messages.len()
    }

    /// Returns `true` if the log holds no messages.
    pub fn is_empty(&self) -> bool {
        self.read_state().messages.is_empty()
    }

    fn push_and_persist(&self, state: &mut LogState, message: Message) -> StoreResult<Arc<Message>> {
        let message = Arc::new(message);
        state.messages.push(Arc::clone(&message));
        self.snapshot.save(&state.messages)?;
        debug!(id = %message.id, kind = %message.kind, total = state.messages.len(), "message appended");
        Ok(message)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, LogState> {
        self.state.read().expect("message log lock poisoned")
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, LogState> {
        self.state.write().expect("message log lock poisoned")
    }
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("MessageStore")
            .field("backend", &self.snapshot.describe())
            .field("message_count", &state.messages.len())
            .field("max_id", &state.max_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msglog_types::{MessageTimestamp, MessageType};
    use std::collections::HashSet;
    use std::thread;

    fn text(id: MessageId, data: &str) -> Message {
        Message {
            client_id: None,
            id,
            kind: MessageType::Text,
            data: data.into(),
            date_time: MessageTimestamp::parse("12-12-2023 12:12:12").unwrap(),
            attachment_names: Vec::new(),
            location: None,
        }
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    #[test]
    fn empty_store_starts_at_one() {
        let store = MessageStore::in_memory();
        assert!(store.is_empty());
        assert_eq!(store.max_id(), MessageId::new(0));
        assert_eq!(store.next_id(), MessageId::new(1));
    }

    #[test]
    fn allocator_seeded_from_snapshot_max() {
        let seeded = InMemorySnapshot::with_messages(vec![
            text(MessageId::new(3), "a"),
            text(MessageId::new(9), "b"),
            text(MessageId::new(5), "c"),
        ]);
        let store = MessageStore::with_backend(Box::new(seeded)).unwrap();
        assert_eq!(store.next_id(), MessageId::new(10));

        let appended = store.append_with(|id| text(id, "d")).unwrap();
        assert_eq!(appended.id, MessageId::new(10));
    }

    #[test]
    fn append_with_assigns_increasing_ids() {
        let store = MessageStore::in_memory();
        let ids: Vec<u64> = (0..5)
            .map(|i| store.append_with(|id| text(id, &format!("m{i}"))).unwrap().id.get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn append_rejects_stale_id() {
        let store = MessageStore::in_memory();
        store.append(text(MessageId::new(4), "a")).unwrap();
        let err = store.append(text(MessageId::new(4), "b")).unwrap_err();
        assert!(matches!(err, StoreError::IdNotIncreasing { .. }));
        // Gaps are fine.
        store.append(text(MessageId::new(10), "c")).unwrap();
        assert_eq!(store.next_id(), MessageId::new(11));
    }

    #[test]
    fn builder_cannot_change_the_id() {
        let store = MessageStore::in_memory();
        let err = store
            .append_with(|_| text(MessageId::new(99), "x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::IdNotIncreasing { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_appends_get_unique_ids() {
        let store = Arc::new(MessageStore::in_memory());
        let mut handles = Vec::new();
        for t in 0..4 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        store
                            .append_with(|id| text(id, &format!("t{t}-{i}")))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            }));
        }

        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(all.len(), 100);

        // Stored order is strictly increasing.
        let messages = store.messages();
        assert!(messages.windows(2).all(|w| w[0].id < w[1].id));
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    #[test]
    fn every_append_rewrites_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");

        let store = MessageStore::open(&path).unwrap();
        store.append_with(|id| text(id, "one")).unwrap();
        store.append_with(|id| text(id, "two")).unwrap();

        let reopened = MessageStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.next_id(), MessageId::new(3));
        assert_eq!(reopened.messages()[1].data, "two");
    }

    #[test]
    fn corrupt_snapshot_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            MessageStore::open(&path),
            Err(StoreError::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn failed_snapshot_write_keeps_memory_append() {
        let backend = Arc::new(InMemorySnapshot::new());
        let store = MessageStore::with_backend(Box::new(SharedSnapshot(Arc::clone(&backend)))).unwrap();

        backend.set_read_only(true);
        let err = store.append_with(|id| text(id, "lost?")).unwrap_err();
        assert!(matches!(err, StoreError::ReadOnly));
        assert_eq!(store.len(), 1);
        assert!(backend.saved().is_empty());

        backend.set_read_only(false);
        store.persist().unwrap();
        assert_eq!(backend.saved().len(), 1);
        // The failed append still consumed its ID.
        assert_eq!(store.next_id(), MessageId::new(2));
    }

    struct SharedSnapshot(Arc<InMemorySnapshot>);

    impl SnapshotBackend for SharedSnapshot {
        fn load(&self) -> StoreResult<Vec<Message>> {
            self.0.load()
        }
        fn save(&self, messages: &[Arc<Message>]) -> StoreResult<()> {
            self.0.save(messages)
        }
        fn describe(&self) -> String {
            self.0.describe()
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[test]
    fn get_by_id() {
        let store = MessageStore::in_memory();
        store.append_with(|id| text(id, "a")).unwrap();
        store.append_with(|id| text(id, "b")).unwrap();

        assert_eq!(store.get(MessageId::new(2)).unwrap().data, "b");
        let err = store.get(MessageId::new(3)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn messages_snapshot_is_stable() {
        let store = MessageStore::in_memory();
        store.append_with(|id| text(id, "a")).unwrap();
        let before = store.messages();
        store.append_with(|id| text(id, "b")).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(store.messages().len(), 2);
    }

    proptest::proptest! {
        #[test]
        fn ids_strictly_increase(count in 1usize..60, seed_max in 0u64..1000) {
            let seeded = if seed_max == 0 {
                Vec::new()
            } else {
                vec![text(MessageId::new(seed_max), "seed")]
            };
            let store = MessageStore::with_backend(Box::new(InMemorySnapshot::with_messages(seeded))).unwrap();
            let mut last = MessageId::new(seed_max);
            for _ in 0..count {
                let id = store.append_with(|id| text(id, "p")).unwrap().id;
                proptest::prop_assert!(id > last);
                proptest::prop_assert_eq!(id, last.next());
                last = id;
            }
        }
    }
}
