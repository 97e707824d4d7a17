//! Listener registry for monitor events.
//!
//! Delivery is synchronous and in registration order. The listener list is
//! snapshotted before each emission, so listeners added or removed while an
//! event is being delivered take effect from the next emission.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

/// Set of listeners for events of type `E`.
pub struct EventBus<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<E> EventBus<E> {
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry<E>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `listener`.
    pub fn on<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
        E: 'static,
    {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));

        let weak: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                    registry.listeners.retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    /// Delivers `event` to every listener registered before this call.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .lock()
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`EventBus::on`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Removes the listener. Later emissions no longer reach it.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order() {
        let bus = EventBus::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            let _ = bus.on(move |n: &u32| seen.lock().unwrap().push(format!("{tag}:{n}")));
        }
        bus.emit(&7);

        assert_eq!(*seen.lock().unwrap(), vec!["first:7", "second:7"]);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::<u32>::new();
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        let sub = bus.on(move |_| *c.lock().unwrap() += 1);

        bus.emit(&1);
        sub.unsubscribe();
        bus.emit(&2);

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_listener_added_during_delivery() {
        let bus = Arc::new(EventBus::<u32>::new());
        let late_calls = Arc::new(Mutex::new(0));

        let bus_inner = Arc::clone(&bus);
        let late = Arc::clone(&late_calls);
        let _ = bus.on(move |_| {
            let late = Arc::clone(&late);
            let _ = bus_inner.on(move |_| *late.lock().unwrap() += 1);
        });

        bus.emit(&1);
        assert_eq!(*late_calls.lock().unwrap(), 0);
        assert_eq!(bus.len(), 2);

        bus.emit(&2);
        assert_eq!(*late_calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = EventBus::<u32>::new();
        let sub = bus.on(|_| {});
        drop(bus);
        sub.unsubscribe();
    }
}
