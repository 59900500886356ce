//! Live push fabric for msglog.
//!
//! The [`Broadcaster`] keeps a registry of open subscriber channels and fans
//! every newly created message out to them. Delivery is at-most-once and
//! best-effort: no retry, no backlog, and no replay for late subscribers,
//! who catch up through the paginated feed instead.

pub mod broadcaster;
pub mod error;

pub use broadcaster::{Broadcaster, BroadcasterConfig, Subscription, SubscriptionId, WirePayload};
pub use error::{FabricError, Result};
