//! Asset cache and loader service
//!
//! The cache is the only shared mutable resource in the layer: a map
//! from string key to either a loaded object or an in-flight entry.
//! Objects are stored type-erased behind `Arc<dyn Any + Send + Sync>` so
//! one cache serves textures, materials, and vector documents alike.
//!
//! Loads never happen inside the cache. Requesting a missing key marks it
//! pending and records the requester; [`crate::Stage::pump_assets`] later
//! feeds pending keys to an injected [`AssetSource`] and delivers results
//! back to the components that asked. The pending entry is created
//! immediately, so a second requester observes it and no duplicate load
//! is ever issued.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::EntityKey;
use crate::error::AssetError;

/// A type-erased, reference-counted asset object
pub type SharedObject = Arc<dyn Any + Send + Sync>;

/// Downcast a shared object to a concrete asset type
pub fn downcast_object<T: Send + Sync + 'static>(object: &SharedObject) -> Option<Arc<T>> {
    object.clone().downcast::<T>().ok()
}

/// The component that asked for an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// Entity owning the component
    pub entity: EntityKey,
    /// Component type name on that entity
    pub component: String,
}

/// What a requester observes at resolution time
#[derive(Clone)]
pub enum AssetSlot {
    /// The object is cached; use it directly
    Ready(SharedObject),
    /// A load is in flight; the object arrives via `on_load`
    Pending,
}

enum Entry {
    Pending { requesters: Vec<Requester> },
    Ready(SharedObject),
}

/// Service that turns an asset key into a loaded object
///
/// Passed explicitly into [`crate::Stage::pump_assets`]; there are no
/// global loader singletons. Production code uses a file-backed source,
/// tests substitute scripted ones.
pub trait AssetSource {
    /// Load the object for `key`
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] if the key cannot be read or parsed.
    fn load(&mut self, key: &str) -> Result<SharedObject, AssetError>;
}

/// Shared store deduplicating loads of external resources by key
pub struct AssetCache {
    entries: HashMap<String, Entry>,
    /// Keys whose load has been requested but not yet handed to a source
    queue: Vec<String>,
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            queue: Vec::new(),
        }
    }

    /// Get a loaded object by key
    ///
    /// Returns `None` for missing and in-flight keys alike.
    pub fn get(&self, key: &str) -> Option<SharedObject> {
        match self.entries.get(key) {
            Some(Entry::Ready(object)) => Some(object.clone()),
            _ => None,
        }
    }

    /// Insert a loaded object under a key
    ///
    /// Used for preloading and by tests; a pending entry for the same key
    /// is replaced (its requesters are dropped, so prefer
    /// [`complete`](Self::complete) on the pump path).
    pub fn add(&mut self, key: impl Into<String>, object: SharedObject) {
        self.entries.insert(key.into(), Entry::Ready(object));
    }

    /// Request an asset, deduplicating concurrent loads
    ///
    /// A cached key returns [`AssetSlot::Ready`]. A missing key creates a
    /// pending entry, queues the key for the next pump, and returns
    /// [`AssetSlot::Pending`]. A key already in flight returns
    /// [`AssetSlot::Pending`] without queueing a second load.
    pub fn request(&mut self, key: &str) -> AssetSlot {
        match self.entries.get(key) {
            Some(Entry::Ready(object)) => AssetSlot::Ready(object.clone()),
            Some(Entry::Pending { .. }) => AssetSlot::Pending,
            None => {
                self.entries.insert(
                    key.to_string(),
                    Entry::Pending { requesters: Vec::new() },
                );
                self.queue.push(key.to_string());
                AssetSlot::Pending
            }
        }
    }

    /// Record a requester for an in-flight key
    ///
    /// No-op if the key is already ready or unknown.
    pub fn subscribe(&mut self, key: &str, requester: Requester) {
        if let Some(Entry::Pending { requesters }) = self.entries.get_mut(key) {
            if !requesters.contains(&requester) {
                requesters.push(requester);
            }
        }
    }

    /// Requesters currently waiting on a key
    pub fn requesters_of(&self, key: &str) -> Vec<Requester> {
        match self.entries.get(key) {
            Some(Entry::Pending { requesters }) => requesters.clone(),
            _ => Vec::new(),
        }
    }

    /// Take the keys queued for loading, leaving the queue empty
    pub fn take_queue(&mut self) -> Vec<String> {
        std::mem::take(&mut self.queue)
    }

    /// Mark a key loaded, returning the requesters to notify
    pub fn complete(&mut self, key: &str, object: SharedObject) -> Vec<Requester> {
        match self.entries.insert(key.to_string(), Entry::Ready(object)) {
            Some(Entry::Pending { requesters }) => requesters,
            _ => Vec::new(),
        }
    }

    /// Drop a failed key, returning the requesters to notify
    ///
    /// The entry is evicted so a later instantiation can request the key
    /// again; nothing retries automatically.
    pub fn fail(&mut self, key: &str) -> Vec<Requester> {
        match self.entries.remove(key) {
            Some(Entry::Pending { requesters }) => requesters,
            _ => Vec::new(),
        }
    }

    /// Whether a key has a loaded object
    pub fn is_ready(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(Entry::Ready(_)))
    }

    /// Whether a key has a load in flight
    pub fn is_pending(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(Entry::Pending { .. }))
    }

    /// Number of entries (loaded and in-flight)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
