//! Session invalidation notifications.
//!
//! The HTTP layer detects token invalidity; the session manager owns the
//! reaction. `AuthEvents` carries that signal between them without a global
//! registry: handlers are registered with `subscribe` and stay live until
//! the returned `Subscription` is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

/// Authentication lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The backend rejected the stored token and it has been deleted.
    SessionInvalidated,
}

type Handler = Arc<dyn Fn(AuthEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    handlers: Mutex<Vec<(u64, Handler)>>,
    next_id: AtomicU64,
}

/// Registry handle for auth event subscribers. Cheap to clone; clones share
/// the same subscriber list.
#[derive(Clone, Default)]
pub struct AuthEvents {
    registry: Arc<Registry>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every emitted event. The handler runs until
    /// the returned subscription is dropped.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(AuthEvent) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver an event to every live subscriber.
    ///
    /// Handlers run outside the registry lock, so they are free to
    /// subscribe or drop subscriptions themselves.
    pub fn emit(&self, event: AuthEvent) {
        let handlers: Vec<Handler> = self
            .registry
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        debug!(?event, subscribers = handlers.len(), "Dispatching auth event");
        for handler in handlers {
            handler(event);
        }
    }
}

/// Keeps a handler registered; dropping it unsubscribes.
#[must_use = "dropping the subscription unregisters the handler"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .handlers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}
