use crate::{order::Order, report::Fill};
use fnv::FnvHashMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tradeforge_data::{books::LevelUpdate, trade::Trade};
use tracing::{error, warn};

/// Engine notifications observable through the [`EventBus`].
#[derive(Debug, Clone)]
pub enum EngineEvent {
    OrderAccepted(Order),
    OrderUpdated(Order),
    OrderFilled { order: Order, fill: Fill },
    OrderCancelled(Order),
    OrderRejected(Order),
    TradeSeen(Trade),
    LevelUpdated(LevelUpdate),
}

/// An engine event subscriber.
///
/// Subscribers receive payloads synchronously on the engine task; they must not mutate engine
/// state directly. A panicking subscriber is isolated and logged, never aborting the loop.
pub trait EngineSubscriber: Send + Sync {
    fn on_event(&self, event: &EngineEvent);
}

/// Identifier of one bus subscription.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: FnvHashMap<u64, Weak<dyn EngineSubscriber>>,
}

/// Synchronous engine event bus.
///
/// Holds only weak references: dropping a subscriber is enough to stop delivery, and an owned
/// [`SubscriptionHandle`] removes the registration in O(1).
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.lock().subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber, returning the handle that removes it again.
    pub fn subscribe(&self, subscriber: &Arc<dyn EngineSubscriber>) -> SubscriptionHandle {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.insert(id, Arc::downgrade(subscriber));

        SubscriptionHandle {
            id: SubscriptionId(id),
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every live subscriber.
    ///
    /// Dead registrations are pruned; a panicking subscriber is caught and logged.
    pub fn publish(&self, event: &EngineEvent) {
        let subscribers = {
            let mut inner = self.inner.lock();
            inner
                .subscribers
                .retain(|_, subscriber| subscriber.strong_count() > 0);
            inner
                .subscribers
                .values()
                .filter_map(Weak::upgrade)
                .collect::<Vec<_>>()
        };

        for subscriber in subscribers {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                subscriber.on_event(event)
            }));
            if outcome.is_err() {
                error!(?event, "engine subscriber panicked; continuing");
            }
        }
    }

    /// Number of live registrations.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner
            .subscribers
            .retain(|_, subscriber| subscriber.strong_count() > 0);
        inner.subscribers.len()
    }
}

/// Owned handle to one bus registration.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    bus: Weak<Mutex<BusInner>>,
}

impl SubscriptionHandle {
    /// Remove the registration from the bus.
    pub fn unsubscribe(self) {
        let Some(bus) = self.bus.upgrade() else {
            warn!("unsubscribe after the bus was dropped");
            return;
        };
        bus.lock().subscribers.remove(&self.id.0);
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}
