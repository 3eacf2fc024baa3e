use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::*;

use crate::{Event, EventType};

pub type SubscriptionId = u64;

/// Publishing side of the bus, the only part the ingestion pipeline depends on.
pub trait EventSink: Send + Sync {
    /// Delivers `event` to every matching subscriber without blocking.
    fn signal_event(&self, event: Event);
}

#[derive(Debug)]
enum SubscriberTx {
    Bounded(mpsc::Sender<Event>),
    Unbounded(mpsc::UnboundedSender<Event>),
}

#[derive(Debug)]
enum SubscriptionRx {
    Bounded(mpsc::Receiver<Event>),
    Unbounded(mpsc::UnboundedReceiver<Event>),
}

#[derive(Debug)]
struct Subscriber {
    types: HashSet<EventType>,
    tx: SubscriberTx,
}

/// Result of handing an event to one subscriber.
enum Delivery {
    Sent,
    Dropped,
    Closed,
}

impl SubscriberTx {
    fn deliver(&self, event: Event) -> Delivery {
        match self {
            SubscriberTx::Bounded(tx) => match tx.try_send(event) {
                Ok(()) => Delivery::Sent,
                Err(TrySendError::Full(_)) => Delivery::Dropped,
                Err(TrySendError::Closed(_)) => Delivery::Closed,
            },
            SubscriberTx::Unbounded(tx) => match tx.send(event) {
                Ok(()) => Delivery::Sent,
                Err(_) => Delivery::Closed,
            },
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    subscribers: HashMap<SubscriptionId, Subscriber>,
    next_id: SubscriptionId,
    closed: bool,
}

/// Receiving end of a subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    types: HashSet<EventType>,
    rx: SubscriptionRx,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn types(&self) -> &HashSet<EventType> {
        &self.types
    }

    /// Waits for the next event, `None` once cancelled or the bus is closed.
    pub async fn recv(&mut self) -> Option<Event> {
        match &mut self.rx {
            SubscriptionRx::Bounded(rx) => rx.recv().await,
            SubscriptionRx::Unbounded(rx) => rx.recv().await,
        }
    }

    pub fn try_recv(&mut self) -> Option<Event> {
        match &mut self.rx {
            SubscriptionRx::Bounded(rx) => rx.try_recv().ok(),
            SubscriptionRx::Unbounded(rx) => rx.try_recv().ok(),
        }
    }
}

/// Typed publish/subscribe register.
///
/// A [`subscribe`](Self::subscribe)r owns a bounded buffer. When it is full the event is
/// dropped for that subscriber only, so a slow consumer never stalls the publisher.
/// Consumers that must see every event use [`subscribe_unbounded`](Self::subscribe_unbounded).
#[derive(Debug)]
pub struct EventManager {
    buffer: usize,
    registry: Mutex<Registry>,
}

impl EventManager {
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Subscribes with a bounded buffer, events are dropped while it is full.
    pub fn subscribe(&self, types: &[EventType]) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.register(
            types,
            SubscriberTx::Bounded(tx),
            SubscriptionRx::Bounded(rx),
        )
    }

    /// Subscribes without a buffer limit, nothing is dropped.
    ///
    /// Meant for consumers that must act on every event of a low-rate type.
    pub fn subscribe_unbounded(&self, types: &[EventType]) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.register(
            types,
            SubscriberTx::Unbounded(tx),
            SubscriptionRx::Unbounded(rx),
        )
    }

    fn register(
        &self,
        types: &[EventType],
        tx: SubscriberTx,
        rx: SubscriptionRx,
    ) -> Subscription {
        let types: HashSet<_> = types.iter().copied().collect();

        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;

        if registry.closed {
            // Dropping the sender hands back a subscription that is already at its end.
            debug!(%id, "subscribe on closed event bus");
        } else {
            registry.subscribers.insert(
                id,
                Subscriber {
                    types: types.clone(),
                    tx,
                },
            );
        }

        Subscription { id, types, rx }
    }

    /// Removes the subscription, returns whether it was still live.
    pub fn cancel_subscription(&self, id: SubscriptionId) -> bool {
        self.registry.lock().subscribers.remove(&id).is_some()
    }

    /// Drops every subscriber. Receivers drain what is buffered and then see the end.
    pub fn close(&self) {
        let mut registry = self.registry.lock();
        registry.closed = true;
        registry.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}

impl EventSink for EventManager {
    fn signal_event(&self, event: Event) {
        let event_type = event.event_type();
        let mut registry = self.registry.lock();
        let mut gone = Vec::new();

        for (id, sub) in registry.subscribers.iter() {
            if !sub.types.contains(&event_type) {
                continue;
            }

            match sub.tx.deliver(event.clone()) {
                Delivery::Sent => {}
                Delivery::Dropped => {
                    warn!(%id, ?event_type, "subscriber buffer full, dropping event");
                }
                Delivery::Closed => gone.push(*id),
            }
        }

        for id in gone {
            debug!(%id, "removing subscriber with closed receiver");
            registry.subscribers.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::iter;

    use tokenscout_primitives::prelude::*;

    use super::*;
    use crate::TokenCandidate;

    fn new_block_event(height: Height) -> Event {
        Event::NewBlock {
            block: Block::new(
                height,
                vec![1; 20],
                "dev".to_string(),
                "2024-01-01T00:00:00Z".to_string(),
                "g1proposer".to_string(),
                Vec::new(),
            ),
            results: Vec::new(),
        }
    }

    fn token_event(path: &str) -> Event {
        Event::TokenDetected(TokenCandidate {
            package_path: path.to_string(),
            height: 1,
            creator: "g1creator".to_string(),
            functions: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_delivery_filters_by_type() {
        let bus = EventManager::new(8);
        let mut blocks = bus.subscribe(&[EventType::NewBlock]);
        let mut tokens = bus.subscribe(&[EventType::TokenDetected]);
        let mut both = bus.subscribe(&[EventType::NewBlock, EventType::TokenDetected]);
        assert_ne!(blocks.id(), tokens.id());

        bus.signal_event(new_block_event(1));
        bus.signal_event(token_event("gno.land/r/demo/foo"));

        assert_eq!(blocks.recv().await, Some(new_block_event(1)));
        assert_eq!(blocks.try_recv(), None);
        assert_eq!(tokens.recv().await, Some(token_event("gno.land/r/demo/foo")));
        assert_eq!(tokens.try_recv(), None);
        assert_eq!(both.recv().await, Some(new_block_event(1)));
        assert_eq!(both.recv().await, Some(token_event("gno.land/r/demo/foo")));
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let bus = EventManager::new(8);
        let mut sub = bus.subscribe(&[EventType::NewBlock]);

        assert!(bus.cancel_subscription(sub.id()));
        assert!(!bus.cancel_subscription(sub.id()));

        bus.signal_event(new_block_event(1));
        assert_eq!(sub.recv().await, None);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_full_subscriber_drops_without_blocking() {
        let bus = EventManager::new(2);
        let mut slow = bus.subscribe(&[EventType::NewBlock]);

        for height in 1..=5 {
            bus.signal_event(new_block_event(height));
        }

        assert_eq!(slow.try_recv(), Some(new_block_event(1)));
        assert_eq!(slow.try_recv(), Some(new_block_event(2)));
        assert_eq!(slow.try_recv(), None);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_unbounded_subscriber_sees_every_event() {
        let bus = EventManager::new(2);
        let mut bounded = bus.subscribe(&[EventType::TokenDetected]);
        let mut lossless = bus.subscribe_unbounded(&[EventType::TokenDetected]);

        let paths: Vec<String> = (0..5).map(|i| format!("gno.land/r/demo/t{i}")).collect();
        for path in &paths {
            bus.signal_event(token_event(path));
        }
        bus.signal_event(new_block_event(1));

        let received: Vec<_> = iter::from_fn(|| lossless.try_recv()).collect();
        assert_eq!(
            received,
            paths.iter().map(|p| token_event(p)).collect::<Vec<_>>()
        );
        assert_eq!(iter::from_fn(|| bounded.try_recv()).count(), 2);

        drop(lossless);
        bus.signal_event(token_event("gno.land/r/demo/late"));
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let bus = EventManager::new(2);
        let sub = bus.subscribe(&[EventType::NewBlock]);
        drop(sub);

        bus.signal_event(new_block_event(1));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_close_ends_subscriptions() {
        let bus = EventManager::new(4);
        let mut sub = bus.subscribe(&[EventType::TokenDetected]);
        bus.signal_event(token_event("gno.land/r/demo/a"));
        bus.close();

        assert_eq!(sub.recv().await, Some(token_event("gno.land/r/demo/a")));
        assert_eq!(sub.recv().await, None);

        let mut late = bus.subscribe(&[EventType::TokenDetected]);
        assert_eq!(late.recv().await, None);
    }
}
