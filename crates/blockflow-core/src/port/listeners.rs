//! Subscription registry for data and exception events.
//!
//! Listeners are boxed closures or shared handler objects, each identified by the
//! [`SubscriptionToken`] returned on registration. Notification snapshots the listener list
//! and invokes it with no lock held.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    fn next() -> Self {
        SubscriptionToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handler object receiving events of type `E`.
pub trait EventHandler<E>: Send + Sync {
    fn handle(&self, event: &E);
}

pub type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

enum Listener<E> {
    Callback(Callback<E>),
    Handler(Arc<dyn EventHandler<E>>),
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        match self {
            Listener::Callback(cb) => Listener::Callback(cb.clone()),
            Listener::Handler(h) => Listener::Handler(h.clone()),
        }
    }
}

impl<E> Listener<E> {
    fn same_target(&self, other: &Listener<E>) -> bool {
        match (self, other) {
            (Listener::Callback(a), Listener::Callback(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            (Listener::Handler(a), Listener::Handler(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }

    fn invoke(&self, event: &E) {
        match self {
            Listener::Callback(cb) => cb(event),
            Listener::Handler(h) => h.handle(event),
        }
    }
}

pub struct Listeners<E> {
    entries: Mutex<Vec<(SubscriptionToken, Listener<E>)>>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<E> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh closure. Each call yields a new subscription.
    pub fn register(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionToken {
        self.insert(Listener::Callback(Arc::new(callback)))
    }

    /// Register a shared closure. Registering the same `Arc` twice returns the existing token.
    pub fn register_shared(&self, callback: Callback<E>) -> SubscriptionToken {
        self.insert(Listener::Callback(callback))
    }

    /// Register a handler object. Registering the same `Arc` twice returns the existing token.
    pub fn register_handler(&self, handler: Arc<dyn EventHandler<E>>) -> SubscriptionToken {
        self.insert(Listener::Handler(handler))
    }

    fn insert(&self, listener: Listener<E>) -> SubscriptionToken {
        let mut entries = self.entries.lock();
        if let Some((token, _)) = entries.iter().find(|(_, l)| l.same_target(&listener)) {
            return *token;
        }
        let token = SubscriptionToken::next();
        entries.push((token, listener));
        token
    }

    /// Remove a subscription. Unknown tokens are ignored; returns whether one was removed.
    pub fn unregister(&self, token: SubscriptionToken) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(t, _)| *t != token);
        entries.len() != before
    }

    pub fn unregister_handler(&self, handler: &Arc<dyn EventHandler<E>>) -> bool {
        let probe = Listener::Handler(handler.clone());
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(_, l)| !l.same_target(&probe));
        entries.len() != before
    }

    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self.entries.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in snapshot {
            listener.invoke(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counting(AtomicUsize);

    impl EventHandler<i32> for Counting {
        fn handle(&self, event: &i32) {
            self.0.fetch_add(*event as usize, Ordering::SeqCst);
        }
    }

    #[test]
    fn handler_registration_is_idempotent() {
        let listeners = Listeners::<i32>::new();
        let handler = Arc::new(Counting(AtomicUsize::new(0)));
        let as_dyn: Arc<dyn EventHandler<i32>> = handler.clone();
        let a = listeners.register_handler(as_dyn.clone());
        let b = listeners.register_handler(as_dyn.clone());
        assert_eq!(a, b);
        assert_eq!(listeners.len(), 1);
        listeners.notify(&3);
        assert_eq!(handler.0.load(Ordering::SeqCst), 3);
        assert!(listeners.unregister_handler(&as_dyn));
        assert!(listeners.is_empty());
    }

    #[test]
    fn unregister_unknown_token_is_noop() {
        let listeners = Listeners::<i32>::new();
        let token = listeners.register(|_| {});
        assert!(listeners.unregister(token));
        assert!(!listeners.unregister(token));
    }

    #[test]
    fn shared_callback_deduplicates() {
        let listeners = Listeners::<i32>::new();
        let cb: Callback<i32> = Arc::new(|_| {});
        let a = listeners.register_shared(cb.clone());
        let b = listeners.register_shared(cb);
        assert_eq!(a, b);
        let c = listeners.register(|_| {});
        assert_ne!(a, c);
        assert_eq!(listeners.len(), 2);
    }
}
