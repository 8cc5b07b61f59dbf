//! Typed lifecycle event channels
//!
//! Each component slot owns one channel per lifecycle signal instead of a
//! single untyped emitter grafted onto the instance. Subscribers are
//! boxed callbacks; the layer is single-threaded so handlers may capture
//! `Rc<RefCell<..>>` state freely.

use crate::assets::SharedObject;

/// Identifier returned by [`EventChannel::subscribe`], usable to
/// unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// A single-signal event channel
///
/// Publishing borrows each subscriber mutably in registration order.
pub struct EventChannel<T> {
    subscribers: Vec<(SubscriberId, Box<dyn FnMut(&T)>)>,
    next_id: u64,
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventChannel<T> {
    /// Create an empty channel
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a callback, returning its id
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a previously registered callback
    ///
    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every subscriber
    pub fn publish(&mut self, event: &T) {
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Payload for the `loaded` channel
#[derive(Clone)]
pub struct LoadedEvent {
    /// Asset key the load was issued under
    pub key: String,
    /// The loaded object, identical to the cache entry
    pub object: SharedObject,
}

/// Payload for the `progress` channel
///
/// Fired when a deferred load is taken up by the asset source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Asset key being loaded
    pub key: String,
}

/// Payload for the `error` channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    /// Asset key whose load failed
    pub key: String,
    /// Human-readable failure description
    pub message: String,
}

/// The five lifecycle channels every component slot owns
#[derive(Default)]
pub struct ComponentEvents {
    /// Fired after the component's enable hook ran
    pub enabled: EventChannel<()>,
    /// Fired after the component's disable hook ran
    pub disabled: EventChannel<()>,
    /// Fired after an asset load was delivered to the component
    pub loaded: EventChannel<LoadedEvent>,
    /// Fired when a load is taken up by the source
    pub progress: EventChannel<ProgressEvent>,
    /// Fired when a load fails; the component stays usable
    pub error: EventChannel<ErrorEvent>,
}

impl ComponentEvents {
    /// Create a fresh set of channels with no subscribers
    pub fn new() -> Self {
        Self::default()
    }
}
