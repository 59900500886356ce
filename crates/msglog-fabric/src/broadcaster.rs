use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use msglog_types::Message;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::error::{FabricError, Result};

/// One encoded message, shared by every subscriber it is delivered to.
pub type WirePayload = Arc<str>;

/// Handle identifying one registered subscriber.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of a subscription.
///
/// Dropping it closes the channel; the broadcaster prunes the registration
/// on its next publish.
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<WirePayload>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next pushed message. `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<WirePayload> {
        self.receiver.recv().await
    }

    /// Take a pushed message if one is waiting.
    pub fn try_recv(&mut self) -> Option<WirePayload> {
        self.receiver.try_recv().ok()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Configuration for the [`Broadcaster`].
#[derive(Clone, Debug)]
pub struct BroadcasterConfig {
    /// Messages buffered per subscriber before further pushes to it are
    /// dropped.
    pub channel_capacity: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Registry of live subscribers with best-effort fan-out.
///
/// Subscribing, unsubscribing and publishing may interleave freely from any
/// thread. A publish only ever uses `try_send`, so a slow or vanished
/// subscriber never blocks or fails delivery to the others.
pub struct Broadcaster {
    subscribers: RwLock<HashMap<SubscriptionId, mpsc::Sender<WirePayload>>>,
    next_id: AtomicU64,
    config: BroadcasterConfig,
}

impl Broadcaster {
    pub fn new(config: BroadcasterConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Register a new subscriber. It receives every message published from
    /// now on, and none published before.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .expect("subscriber lock poisoned")
            .insert(id, tx);
        debug!(subscription = %id, "subscriber added");
        Subscription { id, receiver: rx }
    }

    /// Remove a subscriber. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self
            .subscribers
            .write()
            .expect("subscriber lock poisoned")
            .remove(&id)
            .is_some();
        if removed {
            debug!(subscription = %id, "subscriber removed");
        }
        removed
    }

    /// Encode `message` as JSON and push it to every open subscriber.
    ///
    /// Returns how many subscribers accepted it. Closed channels are pruned;
    /// full channels are skipped for this message only.
    pub fn publish(&self, message: &Message) -> Result<usize> {
        let payload: WirePayload = serde_json::to_string(message)
            .map_err(|e| FabricError::Encoding(e.to_string()))?
            .into();
        Ok(self.publish_payload(payload))
    }

    /// Push an already encoded payload to every open subscriber.
    pub fn publish_payload(&self, payload: WirePayload) -> usize {
        let mut delivered = 0;
        let mut subs = self.subscribers.write().expect("subscriber lock poisoned");
        subs.retain(|id, sender| match sender.try_send(Arc::clone(&payload)) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(subscription = %id, "subscriber lagging, push dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscription = %id, "subscriber closed, pruned");
                false
            }
        });
        delivered
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("subscriber lock poisoned")
            .len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(BroadcasterConfig::default())
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .field("channel_capacity", &self.config.channel_capacity)
            .finish()
    }
}
