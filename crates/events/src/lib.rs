//! In-process publish/subscribe bus for pipeline events.

mod manager;
mod types;

pub use manager::{EventManager, EventSink, Subscription, SubscriptionId};
pub use types::{Event, EventType, TokenCandidate};
