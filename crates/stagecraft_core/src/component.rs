//! The component trait, lifecycle state machine, and per-slot storage

use crate::assets::{AssetCache, SharedObject};
use crate::entity::{Entity, EntityKey};
use crate::error::{AssetError, ConfigError};
use crate::events::ComponentEvents;
use crate::schema::ResolvedParams;

/// Where a component sits in its lifecycle
///
/// `init` creates the slot in `Initialized`; `enable` and `disable` move
/// it between `Enabled` and `Disabled`. Destruction removes the slot, so
/// no state represents it. Enable from `Enabled` is rejected rather than
/// ignored because enable hooks attach objects and must not run twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Configured but never enabled
    Initialized,
    /// Hooks ran, side effects (attachments) are live
    Enabled,
    /// Previously enabled, side effects withdrawn
    Disabled,
}

/// What a lifecycle hook can see and touch
///
/// Borrows the owning entity and the shared asset cache for the duration
/// of one hook call. The slot itself is held out of the entity while the
/// hook runs, so hooks cannot observe or re-enter their own slot.
pub struct ComponentCtx<'a> {
    /// Key of the owning entity
    pub key: EntityKey,
    /// The owning entity (components map excludes the running slot)
    pub entity: &'a mut Entity,
    /// Shared asset cache
    pub assets: &'a mut AssetCache,
    /// Whether the running slot is currently enabled
    pub enabled: bool,
}

/// A configurable, lifecycle-managed behavior on an entity
///
/// Implementations hold their resolved parameters and their wrapped
/// object; the stage drives every hook. Hooks other than `init` have
/// empty defaults so simple components implement only what they need.
pub trait Component {
    /// Configure from resolved parameters
    ///
    /// Runs exactly once, before any other hook. Asset parameters whose
    /// load is still in flight are absent from `params` and arrive later
    /// through [`on_load`](Self::on_load).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] to abort instantiation; the slot is
    /// discarded and the entity is left as if the call never happened.
    fn init(&mut self, ctx: &mut ComponentCtx, params: ResolvedParams) -> Result<(), ConfigError>;

    /// Activate side effects (attach objects, start behaviors)
    fn on_enable(&mut self, _ctx: &mut ComponentCtx) {}

    /// Withdraw side effects; the component must be re-enableable
    fn on_disable(&mut self, _ctx: &mut ComponentCtx) {}

    /// A deferred asset load completed
    ///
    /// Delivered only while the slot still exists; `ctx.enabled` reports
    /// whether side effects should be refreshed now or deferred to the
    /// next enable.
    fn on_load(&mut self, _ctx: &mut ComponentCtx, _key: &str, _object: &SharedObject) {}

    /// A deferred asset load failed
    ///
    /// The component stays usable; implementations typically keep their
    /// fallback object.
    fn on_error(&mut self, _ctx: &mut ComponentCtx, _key: &str, _error: &AssetError) {}

    /// The wrapped object this component currently exposes, if any
    fn ref_object(&self) -> Option<SharedObject> {
        None
    }
}

/// One component instance living on an entity
pub struct ComponentSlot {
    pub(crate) type_name: String,
    pub(crate) state: LifecycleState,
    pub(crate) component: Box<dyn Component>,
    pub(crate) events: ComponentEvents,
}

impl ComponentSlot {
    pub(crate) fn new(type_name: impl Into<String>, component: Box<dyn Component>) -> Self {
        Self {
            type_name: type_name.into(),
            state: LifecycleState::Initialized,
            component,
            events: ComponentEvents::new(),
        }
    }

    /// The component's registered type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the slot is enabled
    pub fn is_enabled(&self) -> bool {
        self.state == LifecycleState::Enabled
    }

    /// The component's lifecycle event channels
    pub fn events(&self) -> &ComponentEvents {
        &self.events
    }

    /// Mutable access to the event channels, for subscribing
    pub fn events_mut(&mut self) -> &mut ComponentEvents {
        &mut self.events
    }

    /// The wrapped object the component exposes, if any
    pub fn ref_object(&self) -> Option<SharedObject> {
        self.component.ref_object()
    }

    /// Borrow the component implementation
    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }
}
