use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use msglog_fabric::Broadcaster;
use msglog_types::{Message, MessageId};
use tracing::{debug, warn};

enum Slot {
    /// Allocated, still writing attachments.
    Pending,
    /// Finished. `None` when creation failed after allocation.
    Ready(Option<Arc<Message>>),
}

/// Releases pushes to subscribers in ID order.
///
/// Every allocated ID is reserved while the store's write lock is held, so
/// reservations arrive in ID order. A finished message is pushed only once
/// every lower reserved ID has finished too; a failed creation releases its
/// slot without a push so later messages are not held back.
#[derive(Default)]
pub struct PublishSequencer {
    slots: Mutex<BTreeMap<MessageId, Slot>>,
}

impl PublishSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold back pushes above `id` until `id` is released.
    pub fn reserve(&self, id: MessageId) {
        self.lock().insert(id, Slot::Pending);
    }

    /// Mark `id` finished and push every message that is now at the head of
    /// the queue. Returns how many messages were pushed by this call.
    pub fn release(
        &self,
        id: MessageId,
        message: Option<Arc<Message>>,
        broadcaster: &Broadcaster,
    ) -> usize {
        let mut slots = self.lock();
        slots.insert(id, Slot::Ready(message));

        // Pushing under the lock keeps two releasers from interleaving.
        let mut pushed = 0;
        while let Some(head) = slots.first_entry() {
            if matches!(head.get(), Slot::Pending) {
                break;
            }
            let Slot::Ready(Some(message)) = head.remove() else {
                continue;
            };
            match broadcaster.publish(&message) {
                Ok(delivered) => debug!(id = %message.id, delivered, "message pushed"),
                Err(e) => warn!(id = %message.id, error = %e, "message not pushed"),
            }
            pushed += 1;
        }
        pushed
    }

    /// Reserved IDs not yet pushed or skipped.
    pub fn backlog(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<MessageId, Slot>> {
        self.slots.lock().expect("publish sequencer lock poisoned")
    }
}

impl std::fmt::Debug for PublishSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishSequencer")
            .field("backlog", &self.backlog())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msglog_types::{MessageTimestamp, MessageType};

    fn message(id: u64) -> Arc<Message> {
        Arc::new(Message {
            client_id: None,
            id: MessageId::new(id),
            kind: MessageType::Text,
            data: format!("msg{id}"),
            date_time: MessageTimestamp::parse("02-02-2022 02:02:02").unwrap(),
            attachment_names: Vec::new(),
            location: None,
        })
    }

    fn drain_ids(sub: &mut msglog_fabric::Subscription) -> Vec<u64> {
        let mut ids = Vec::new();
        while let Some(payload) = sub.try_recv() {
            let pushed: Message = serde_json::from_str(&payload).unwrap();
            ids.push(pushed.id.get());
        }
        ids
    }

    #[test]
    fn later_message_waits_for_earlier() {
        let broadcaster = Broadcaster::default();
        let mut sub = broadcaster.subscribe();
        let sequencer = PublishSequencer::new();
        sequencer.reserve(MessageId::new(1));
        sequencer.reserve(MessageId::new(2));

        assert_eq!(sequencer.release(MessageId::new(2), Some(message(2)), &broadcaster), 0);
        assert!(drain_ids(&mut sub).is_empty());

        assert_eq!(sequencer.release(MessageId::new(1), Some(message(1)), &broadcaster), 2);
        assert_eq!(drain_ids(&mut sub), vec![1, 2]);
        assert_eq!(sequencer.backlog(), 0);
    }

    #[test]
    fn failed_creation_does_not_block_later_pushes() {
        let broadcaster = Broadcaster::default();
        let mut sub = broadcaster.subscribe();
        let sequencer = PublishSequencer::new();
        for id in 1..=3 {
            sequencer.reserve(MessageId::new(id));
        }

        sequencer.release(MessageId::new(3), Some(message(3)), &broadcaster);
        sequencer.release(MessageId::new(2), Some(message(2)), &broadcaster);
        assert!(drain_ids(&mut sub).is_empty());

        sequencer.release(MessageId::new(1), None, &broadcaster);
        assert_eq!(drain_ids(&mut sub), vec![2, 3]);
        assert_eq!(sequencer.backlog(), 0);
    }

    #[test]
    fn unreserved_release_pushes_immediately() {
        let broadcaster = Broadcaster::default();
        let mut sub = broadcaster.subscribe();
        let sequencer = PublishSequencer::new();
        assert_eq!(sequencer.release(MessageId::new(7), Some(message(7)), &broadcaster), 1);
        assert_eq!(drain_ids(&mut sub), vec![7]);
    }
}
