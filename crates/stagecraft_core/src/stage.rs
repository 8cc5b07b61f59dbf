//! The stage: entities, the component registry, and the asset pump
//!
//! All lifecycle transitions flow through the stage. It enforces the
//! state machine, runs component hooks with a borrowed context, and
//! publishes the matching event after each hook returns, so subscribers
//! always observe post-hook state.

use slotmap::SlotMap;

use crate::assets::{AssetCache, AssetSource, Requester, SharedObject};
use crate::component::{ComponentCtx, ComponentSlot, LifecycleState};
use crate::entity::{Entity, EntityKey};
use crate::error::{ConfigError, LifecycleError, StageError};
use crate::events::{ComponentEvents, ErrorEvent, LoadedEvent, ProgressEvent};
use crate::registry::ComponentRegistry;
use crate::value::ConfigMap;

/// Owner of all entities and the shared asset cache
pub struct Stage {
    registry: ComponentRegistry,
    entities: SlotMap<EntityKey, Entity>,
    assets: AssetCache,
}

impl Stage {
    /// Create a stage over a registry of component types
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            entities: SlotMap::with_key(),
            assets: AssetCache::new(),
        }
    }

    /// The component type registry
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// The shared asset cache
    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    /// Mutable access to the asset cache, for preloading
    pub fn assets_mut(&mut self) -> &mut AssetCache {
        &mut self.assets
    }

    /// Create an empty entity
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityKey {
        let name = name.into();
        log::debug!("Spawning entity '{}'", name);
        self.entities.insert(Entity::new(name))
    }

    /// Remove an entity and all its components
    ///
    /// Enabled components are disabled first so their side effects are
    /// withdrawn. In-flight asset loads the entity requested keep
    /// loading into the cache; their deliveries to this entity are
    /// dropped. Returns `false` if the key was already gone.
    pub fn despawn(&mut self, key: EntityKey) -> bool {
        let Some(entity) = self.entities.get(key) else {
            return false;
        };
        let names: Vec<String> = entity.components.keys().cloned().collect();
        for name in names {
            if self.is_enabled(key, &name) {
                // Errors cannot occur here; the slot was just observed enabled.
                let _ = self.disable(key, &name);
            }
        }
        self.entities.remove(key).is_some()
    }

    /// Borrow an entity
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Borrow an entity mutably
    pub fn entity_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over live entity keys
    pub fn entity_keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.entities.keys()
    }

    /// Instantiate a component on an entity from a raw config
    ///
    /// Resolves the config against the registered schema, creates the
    /// instance, and runs its `init` hook. Asset fields whose load is in
    /// flight are subscribed for later delivery through the pump. The
    /// new slot starts `Initialized`; call [`enable`](Self::enable) to
    /// activate it.
    ///
    /// # Errors
    ///
    /// On any error the entity is left without the component: lookup and
    /// resolution run before the entity is touched, and a failing `init`
    /// discards the slot.
    pub fn add_component(
        &mut self,
        key: EntityKey,
        type_name: &str,
        config: &ConfigMap,
    ) -> Result<(), StageError> {
        let entity = self
            .entities
            .get(key)
            .ok_or(LifecycleError::UnknownEntity)?;
        if entity.has_component(type_name) {
            return Err(LifecycleError::DuplicateComponent(type_name.to_string()).into());
        }

        let schema = self.registry.schema_of(type_name)?;
        let params = schema.resolve(config, &mut self.assets)?;
        let pending: Vec<String> = params.pending().iter().map(|p| p.key.clone()).collect();
        let component = self.registry.create(type_name)?;

        let slot = ComponentSlot::new(type_name, component);
        self.entities
            .get_mut(key)
            .ok_or(LifecycleError::UnknownEntity)?
            .components
            .insert(type_name.to_string(), slot);

        let init_result: Result<(), ConfigError> = self
            .with_slot(key, type_name, |slot, ctx| {
                slot.component.init(ctx, params)
            })
            .unwrap_or(Ok(()));

        if let Err(err) = init_result {
            if let Some(entity) = self.entities.get_mut(key) {
                entity.components.remove(type_name);
            }
            return Err(err.into());
        }

        for asset_key in pending {
            self.assets.subscribe(
                &asset_key,
                Requester {
                    entity: key,
                    component: type_name.to_string(),
                },
            );
        }
        log::debug!("Added component '{}' to entity", type_name);
        Ok(())
    }

    /// Enable a component, running its enable hook and firing `enabled`
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyEnabled`] if the component is
    /// enabled; enable hooks attach objects and must not run twice.
    pub fn enable(&mut self, key: EntityKey, type_name: &str) -> Result<(), LifecycleError> {
        match self.slot_state(key, type_name)? {
            LifecycleState::Enabled => {
                Err(LifecycleError::AlreadyEnabled(type_name.to_string()))
            }
            LifecycleState::Initialized | LifecycleState::Disabled => {
                self.with_slot(key, type_name, |slot, ctx| {
                    slot.state = LifecycleState::Enabled;
                    ctx.enabled = true;
                    slot.component.on_enable(ctx);
                    slot.events.enabled.publish(&());
                });
                Ok(())
            }
        }
    }

    /// Disable a component, running its disable hook and firing `disabled`
    ///
    /// Disabling a component that is not enabled is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`LifecycleError`] if the entity or component is gone.
    pub fn disable(&mut self, key: EntityKey, type_name: &str) -> Result<(), LifecycleError> {
        match self.slot_state(key, type_name)? {
            LifecycleState::Initialized | LifecycleState::Disabled => Ok(()),
            LifecycleState::Enabled => {
                self.with_slot(key, type_name, |slot, ctx| {
                    slot.state = LifecycleState::Disabled;
                    ctx.enabled = false;
                    slot.component.on_disable(ctx);
                    slot.events.disabled.publish(&());
                });
                Ok(())
            }
        }
    }

    /// Remove a component from an entity, disabling it first if enabled
    ///
    /// # Errors
    ///
    /// Returns a [`LifecycleError`] if the entity or component is gone.
    pub fn remove_component(
        &mut self,
        key: EntityKey,
        type_name: &str,
    ) -> Result<(), LifecycleError> {
        self.disable(key, type_name)?;
        self.entities
            .get_mut(key)
            .ok_or(LifecycleError::UnknownEntity)?
            .components
            .remove(type_name)
            .ok_or_else(|| LifecycleError::UnknownComponent(type_name.to_string()))?;
        Ok(())
    }

    /// Whether a component is currently enabled
    pub fn is_enabled(&self, key: EntityKey, type_name: &str) -> bool {
        self.entities
            .get(key)
            .and_then(|e| e.components.get(type_name))
            .map(ComponentSlot::is_enabled)
            .unwrap_or(false)
    }

    /// The wrapped object a component currently exposes
    pub fn ref_object(&self, key: EntityKey, type_name: &str) -> Option<SharedObject> {
        self.entities
            .get(key)?
            .components
            .get(type_name)?
            .ref_object()
    }

    /// Event channels of a component, for subscribing
    pub fn component_events_mut(
        &mut self,
        key: EntityKey,
        type_name: &str,
    ) -> Option<&mut ComponentEvents> {
        self.entities
            .get_mut(key)?
            .components
            .get_mut(type_name)
            .map(ComponentSlot::events_mut)
    }

    /// Drive queued asset loads through a source
    ///
    /// Takes every queued key, fires `progress` on each waiting
    /// component, loads through `source`, then delivers the result:
    /// `on_load` plus a `loaded` event on success, `on_error` plus an
    /// `error` event on failure. Requesters whose entity or component no
    /// longer exists are skipped. Failed keys are evicted from the cache
    /// so a later request can retry. Returns the number of keys pumped.
    pub fn pump_assets(&mut self, source: &mut dyn AssetSource) -> usize {
        let queue = self.assets.take_queue();
        let count = queue.len();

        for asset_key in queue {
            for requester in self.assets.requesters_of(&asset_key) {
                let event = ProgressEvent {
                    key: asset_key.clone(),
                };
                self.with_slot(requester.entity, &requester.component, |slot, _ctx| {
                    slot.events.progress.publish(&event);
                });
            }

            match source.load(&asset_key) {
                Ok(object) => {
                    log::debug!("Loaded asset '{}'", asset_key);
                    for requester in self.assets.complete(&asset_key, object.clone()) {
                        let delivered = self.with_slot(
                            requester.entity,
                            &requester.component,
                            |slot, ctx| {
                                slot.component.on_load(ctx, &asset_key, &object);
                                slot.events.loaded.publish(&LoadedEvent {
                                    key: asset_key.clone(),
                                    object: object.clone(),
                                });
                            },
                        );
                        if delivered.is_none() {
                            log::debug!(
                                "Dropping '{}' delivery; requester is gone",
                                asset_key
                            );
                        }
                    }
                }
                Err(err) => {
                    log::warn!("Failed to load asset '{}': {}", asset_key, err);
                    for requester in self.assets.fail(&asset_key) {
                        self.with_slot(requester.entity, &requester.component, |slot, ctx| {
                            slot.component.on_error(ctx, &asset_key, &err);
                            slot.events.error.publish(&ErrorEvent {
                                key: asset_key.clone(),
                                message: err.to_string(),
                            });
                        });
                    }
                }
            }
        }
        count
    }

    fn slot_state(
        &self,
        key: EntityKey,
        type_name: &str,
    ) -> Result<LifecycleState, LifecycleError> {
        self.entities
            .get(key)
            .ok_or(LifecycleError::UnknownEntity)?
            .components
            .get(type_name)
            .map(ComponentSlot::state)
            .ok_or_else(|| LifecycleError::UnknownComponent(type_name.to_string()))
    }

    /// Run a closure against a slot with a hook context
    ///
    /// The slot is taken out of the entity for the duration, so the
    /// closure sees the entity without it, and is put back afterwards.
    fn with_slot<R>(
        &mut self,
        key: EntityKey,
        type_name: &str,
        f: impl FnOnce(&mut ComponentSlot, &mut ComponentCtx) -> R,
    ) -> Option<R> {
        let entity = self.entities.get_mut(key)?;
        let mut slot = entity.components.remove(type_name)?;
        let enabled = slot.is_enabled();
        let result = {
            let mut ctx = ComponentCtx {
                key,
                entity,
                assets: &mut self.assets,
                enabled,
            };
            f(&mut slot, &mut ctx)
        };
        if let Some(entity) = self.entities.get_mut(key) {
            entity.components.insert(slot.type_name.clone(), slot);
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::error::AssetError;
    use crate::schema::{FieldSpec, LiteralType, ResolvedParams, Schema};
    use crate::value::Value;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::sync::Arc;

    /// Records every hook call it receives.
    struct Probe {
        trace: Rc<RefCell<Vec<String>>>,
        object: Option<SharedObject>,
    }

    impl Component for Probe {
        fn init(
            &mut self,
            _ctx: &mut ComponentCtx,
            params: ResolvedParams,
        ) -> Result<(), ConfigError> {
            if params.boolean("fail_init").unwrap_or(false) {
                return Err(ConfigError::InvalidValue {
                    field: "fail_init".to_string(),
                    expected: "false",
                });
            }
            self.trace.borrow_mut().push("init".to_string());
            Ok(())
        }

        fn on_enable(&mut self, ctx: &mut ComponentCtx) {
            assert!(ctx.enabled);
            self.trace.borrow_mut().push("enable".to_string());
        }

        fn on_disable(&mut self, ctx: &mut ComponentCtx) {
            assert!(!ctx.enabled);
            self.trace.borrow_mut().push("disable".to_string());
        }

        fn on_load(&mut self, _ctx: &mut ComponentCtx, key: &str, object: &SharedObject) {
            self.object = Some(object.clone());
            self.trace.borrow_mut().push(format!("load:{}", key));
        }

        fn on_error(&mut self, _ctx: &mut ComponentCtx, key: &str, _error: &AssetError) {
            self.trace.borrow_mut().push(format!("error:{}", key));
        }

        fn ref_object(&self) -> Option<SharedObject> {
            self.object.clone()
        }
    }

    struct MapSource {
        objects: HashMap<String, SharedObject>,
        loads: Vec<String>,
    }

    impl MapSource {
        fn new() -> Self {
            Self {
                objects: HashMap::new(),
                loads: Vec::new(),
            }
        }

        fn with(mut self, key: &str, object: SharedObject) -> Self {
            self.objects.insert(key.to_string(), object);
            self
        }
    }

    impl AssetSource for MapSource {
        fn load(&mut self, key: &str) -> Result<SharedObject, AssetError> {
            self.loads.push(key.to_string());
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| AssetError::NotFound(key.to_string()))
        }
    }

    fn probe_stage(trace: Rc<RefCell<Vec<String>>>) -> Stage {
        let mut registry = ComponentRegistry::new();
        let schema = Schema::new()
            .field(FieldSpec::literal("fail_init", LiteralType::Bool).with_default(false))
            .field(FieldSpec::asset("map"));
        registry
            .register("probe", schema, move || {
                Box::new(Probe {
                    trace: trace.clone(),
                    object: None,
                })
            })
            .unwrap();
        Stage::new(registry)
    }

    fn config(pairs: &[(&str, Value)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_spawn_and_despawn() {
        let mut stage = probe_stage(Rc::new(RefCell::new(Vec::new())));
        let key = stage.spawn("player");
        assert_eq!(stage.entity_count(), 1);
        assert_eq!(stage.entity(key).unwrap().name(), "player");

        assert!(stage.despawn(key));
        assert!(!stage.despawn(key));
        assert_eq!(stage.entity_count(), 0);
    }

    #[test]
    fn test_lifecycle_order_and_events() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut stage = probe_stage(trace.clone());
        let key = stage.spawn("e");

        stage.add_component(key, "probe", &ConfigMap::new()).unwrap();

        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = fired.clone();
        stage
            .component_events_mut(key, "probe")
            .unwrap()
            .enabled
            .subscribe(move |_| sink.borrow_mut().push("enabled"));
        let sink = fired.clone();
        stage
            .component_events_mut(key, "probe")
            .unwrap()
            .disabled
            .subscribe(move |_| sink.borrow_mut().push("disabled"));

        stage.enable(key, "probe").unwrap();
        stage.disable(key, "probe").unwrap();
        stage.enable(key, "probe").unwrap();

        assert_eq!(*trace.borrow(), vec!["init", "enable", "disable", "enable"]);
        assert_eq!(*fired.borrow(), vec!["enabled", "disabled", "enabled"]);
    }

    #[test]
    fn test_double_enable_rejected() {
        let mut stage = probe_stage(Rc::new(RefCell::new(Vec::new())));
        let key = stage.spawn("e");
        stage.add_component(key, "probe", &ConfigMap::new()).unwrap();
        stage.enable(key, "probe").unwrap();

        assert_eq!(
            stage.enable(key, "probe"),
            Err(LifecycleError::AlreadyEnabled("probe".to_string()))
        );
    }

    #[test]
    fn test_disable_before_enable_is_noop() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut stage = probe_stage(trace.clone());
        let key = stage.spawn("e");
        stage.add_component(key, "probe", &ConfigMap::new()).unwrap();

        stage.disable(key, "probe").unwrap();
        assert_eq!(*trace.borrow(), vec!["init"]);
    }

    #[test]
    fn test_unknown_type_leaves_entity_untouched() {
        let mut stage = probe_stage(Rc::new(RefCell::new(Vec::new())));
        let key = stage.spawn("e");

        let err = stage
            .add_component(key, "ghost", &ConfigMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            StageError::Config(ConfigError::UnknownType(_))
        ));
        assert!(stage.entity(key).unwrap().component_names().is_empty());
        assert!(stage.assets().is_empty());
    }

    #[test]
    fn test_failed_init_discards_slot() {
        let mut stage = probe_stage(Rc::new(RefCell::new(Vec::new())));
        let key = stage.spawn("e");

        let err = stage
            .add_component(key, "probe", &config(&[("fail_init", Value::Bool(true))]))
            .unwrap_err();
        assert!(matches!(err, StageError::Config(_)));
        assert!(!stage.entity(key).unwrap().has_component("probe"));
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let mut stage = probe_stage(Rc::new(RefCell::new(Vec::new())));
        let key = stage.spawn("e");
        stage.add_component(key, "probe", &ConfigMap::new()).unwrap();

        let err = stage
            .add_component(key, "probe", &ConfigMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            StageError::Lifecycle(LifecycleError::DuplicateComponent(_))
        ));
    }

    #[test]
    fn test_pump_delivers_load_and_events() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut stage = probe_stage(trace.clone());
        let key = stage.spawn("e");
        stage
            .add_component(key, "probe", &config(&[("map", Value::from("tex.png"))]))
            .unwrap();

        let fired = Rc::new(RefCell::new(Vec::new()));
        let events = stage.component_events_mut(key, "probe").unwrap();
        let sink = fired.clone();
        events
            .progress
            .subscribe(move |e| sink.borrow_mut().push(format!("progress:{}", e.key)));
        let sink = fired.clone();
        events
            .loaded
            .subscribe(move |e| sink.borrow_mut().push(format!("loaded:{}", e.key)));

        let object: SharedObject = Arc::new("pixels".to_string());
        let mut source = MapSource::new().with("tex.png", object.clone());
        assert_eq!(stage.pump_assets(&mut source), 1);

        assert_eq!(*trace.borrow(), vec!["init", "load:tex.png"]);
        assert_eq!(
            *fired.borrow(),
            vec!["progress:tex.png", "loaded:tex.png"]
        );
        assert!(Arc::ptr_eq(
            &stage.ref_object(key, "probe").unwrap(),
            &object
        ));
        // Nothing left queued.
        assert_eq!(stage.pump_assets(&mut source), 0);
    }

    #[test]
    fn test_pump_dedups_shared_key() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut stage = probe_stage(trace.clone());
        let a = stage.spawn("a");
        let b = stage.spawn("b");
        let cfg = config(&[("map", Value::from("tex.png"))]);
        stage.add_component(a, "probe", &cfg).unwrap();
        stage.add_component(b, "probe", &cfg).unwrap();

        let object: SharedObject = Arc::new(7u32);
        let mut source = MapSource::new().with("tex.png", object.clone());
        stage.pump_assets(&mut source);

        // One physical load, both components delivered the same Arc.
        assert_eq!(source.loads, vec!["tex.png"]);
        assert!(Arc::ptr_eq(&stage.ref_object(a, "probe").unwrap(), &object));
        assert!(Arc::ptr_eq(&stage.ref_object(b, "probe").unwrap(), &object));
    }

    #[test]
    fn test_pump_failure_emits_error_and_evicts() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut stage = probe_stage(trace.clone());
        let key = stage.spawn("e");
        stage
            .add_component(key, "probe", &config(&[("map", Value::from("bad.png"))]))
            .unwrap();

        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = fired.clone();
        stage
            .component_events_mut(key, "probe")
            .unwrap()
            .error
            .subscribe(move |e| sink.borrow_mut().push(e.message.clone()));

        let mut source = MapSource::new();
        stage.pump_assets(&mut source);

        assert_eq!(*trace.borrow(), vec!["init", "error:bad.png"]);
        assert_eq!(fired.borrow().len(), 1);
        assert!(fired.borrow()[0].contains("bad.png"));
        // The component survives the failure, and the key can be re-requested.
        assert!(stage.entity(key).unwrap().has_component("probe"));
        assert!(!stage.assets().is_pending("bad.png"));
    }

    #[test]
    fn test_load_after_despawn_dropped_silently() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut stage = probe_stage(trace.clone());
        let key = stage.spawn("e");
        stage
            .add_component(key, "probe", &config(&[("map", Value::from("tex.png"))]))
            .unwrap();
        stage.despawn(key);

        let mut source = MapSource::new().with("tex.png", Arc::new(1u8) as SharedObject);
        stage.pump_assets(&mut source);

        // The object still landed in the cache for future requesters.
        assert!(stage.assets().is_ready("tex.png"));
        assert_eq!(*trace.borrow(), vec!["init"]);
    }

    #[test]
    fn test_remove_component_disables_first() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut stage = probe_stage(trace.clone());
        let key = stage.spawn("e");
        stage.add_component(key, "probe", &ConfigMap::new()).unwrap();
        stage.enable(key, "probe").unwrap();

        stage.remove_component(key, "probe").unwrap();
        assert_eq!(*trace.borrow(), vec!["init", "enable", "disable"]);
        assert!(!stage.entity(key).unwrap().has_component("probe"));
    }

    #[test]
    fn test_despawn_disables_enabled_components() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut stage = probe_stage(trace.clone());
        let key = stage.spawn("e");
        stage.add_component(key, "probe", &ConfigMap::new()).unwrap();
        stage.enable(key, "probe").unwrap();

        stage.despawn(key);
        assert_eq!(*trace.borrow(), vec!["init", "enable", "disable"]);
    }
}
