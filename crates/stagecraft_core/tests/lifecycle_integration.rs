//! Integration tests driving the stage through its public API
//!
//! A small badge component stands in for the built-in types: it wraps a
//! string object built from its config plus an optionally-deferred icon
//! asset, and attaches the object to its entity while enabled.

use std::collections::HashMap;
use std::sync::Arc;

use stagecraft_core::{
    downcast_object, AssetError, AssetSource, Component, ComponentCtx, ComponentRegistry,
    ConfigError, ConfigMap, FieldSpec, LiteralType, ResolvedParams, Schema, SharedObject, Stage,
    Value,
};

#[derive(Debug, PartialEq)]
struct Badge {
    label: String,
    icon: Option<String>,
}

#[derive(Default)]
struct BadgeComponent {
    label: String,
    icon: Option<Arc<String>>,
    object: Option<SharedObject>,
}

impl BadgeComponent {
    fn rebuild(&mut self, ctx: &mut ComponentCtx) {
        let object: SharedObject = Arc::new(Badge {
            label: self.label.clone(),
            icon: self.icon.as_ref().map(|i| i.as_str().to_string()),
        });
        self.object = Some(object.clone());
        if ctx.enabled {
            ctx.entity.attach("badge", object);
        }
    }
}

impl Component for BadgeComponent {
    fn init(&mut self, _ctx: &mut ComponentCtx, params: ResolvedParams) -> Result<(), ConfigError> {
        self.label = params.text("label").unwrap_or("unnamed").to_string();
        if let Some(object) = params.get("icon").and_then(|p| p.as_object()) {
            self.icon = downcast_object::<String>(object);
        }
        Ok(())
    }

    fn on_enable(&mut self, ctx: &mut ComponentCtx) {
        self.rebuild(ctx);
    }

    fn on_disable(&mut self, ctx: &mut ComponentCtx) {
        ctx.entity.detach("badge");
    }

    fn on_load(&mut self, ctx: &mut ComponentCtx, _key: &str, object: &SharedObject) {
        self.icon = downcast_object::<String>(object);
        if ctx.enabled {
            self.rebuild(ctx);
        }
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
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            objects: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Arc::new(v.to_string()) as SharedObject))
                .collect(),
            loads: Vec::new(),
        }
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

fn badge_stage() -> Stage {
    let mut registry = ComponentRegistry::new();
    let schema = Schema::new()
        .field(FieldSpec::literal("label", LiteralType::Text).with_default("unnamed"))
        .field(FieldSpec::asset("icon"));
    registry
        .register("badge", schema, || Box::<BadgeComponent>::default())
        .unwrap();
    Stage::new(registry)
}

fn config(pairs: &[(&str, &str)]) -> ConfigMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::from(*v)))
        .collect()
}

#[test]
fn test_enable_before_load_attaches_exactly_once() {
    let mut stage = badge_stage();
    let key = stage.spawn("hero");
    stage
        .add_component(key, "badge", &config(&[("label", "Hero"), ("icon", "star.svg")]))
        .unwrap();
    stage.enable(key, "badge").unwrap();

    // Enabled before the icon arrived: attached without it.
    let entity = stage.entity(key).unwrap();
    assert_eq!(entity.attachment_count(), 1);
    let badge = downcast_object::<Badge>(entity.attachment("badge").unwrap()).unwrap();
    assert_eq!(badge.icon, None);

    let mut source = MapSource::new(&[("star.svg", "<svg/>")]);
    stage.pump_assets(&mut source);

    // The late load replaced the attachment rather than adding one.
    let entity = stage.entity(key).unwrap();
    assert_eq!(entity.attachment_count(), 1);
    let badge = downcast_object::<Badge>(entity.attachment("badge").unwrap()).unwrap();
    assert_eq!(badge.icon.as_deref(), Some("<svg/>"));
}

#[test]
fn test_disable_reenable_does_not_reload() {
    let mut stage = badge_stage();
    let key = stage.spawn("hero");
    stage
        .add_component(key, "badge", &config(&[("icon", "star.svg")]))
        .unwrap();

    let mut source = MapSource::new(&[("star.svg", "<svg/>")]);
    stage.pump_assets(&mut source);
    stage.enable(key, "badge").unwrap();
    stage.disable(key, "badge").unwrap();
    assert_eq!(stage.entity(key).unwrap().attachment_count(), 0);

    stage.enable(key, "badge").unwrap();
    stage.pump_assets(&mut source);

    // Re-enable reuses the already-loaded icon; no second physical load.
    assert_eq!(source.loads, vec!["star.svg"]);
    assert_eq!(stage.entity(key).unwrap().attachment_count(), 1);
}

#[test]
fn test_load_after_disable_defers_attach_until_reenable() {
    let mut stage = badge_stage();
    let key = stage.spawn("hero");
    stage
        .add_component(key, "badge", &config(&[("icon", "star.svg")]))
        .unwrap();
    stage.enable(key, "badge").unwrap();
    stage.disable(key, "badge").unwrap();

    // The icon arrives while the badge is disabled: cached, not attached.
    let mut source = MapSource::new(&[("star.svg", "<svg/>")]);
    stage.pump_assets(&mut source);
    assert!(stage.assets().is_ready("star.svg"));
    assert_eq!(stage.entity(key).unwrap().attachment_count(), 0);

    // Re-enable attaches from the cache with the icon, no second load.
    stage.enable(key, "badge").unwrap();
    assert_eq!(source.loads, vec!["star.svg"]);
    let entity = stage.entity(key).unwrap();
    assert_eq!(entity.attachment_count(), 1);
    let badge = downcast_object::<Badge>(entity.attachment("badge").unwrap()).unwrap();
    assert_eq!(badge.icon.as_deref(), Some("<svg/>"));
}

#[test]
fn test_shared_icon_is_one_cache_entry() {
    let mut stage = badge_stage();
    let a = stage.spawn("a");
    let b = stage.spawn("b");
    let cfg = config(&[("icon", "star.svg")]);
    stage.add_component(a, "badge", &cfg).unwrap();
    stage.add_component(b, "badge", &cfg).unwrap();

    let mut source = MapSource::new(&[("star.svg", "<svg/>")]);
    assert_eq!(stage.pump_assets(&mut source), 1);
    assert_eq!(source.loads.len(), 1);
    assert!(stage.assets().is_ready("star.svg"));
}

#[test]
fn test_failed_icon_leaves_badge_usable() {
    let mut stage = badge_stage();
    let key = stage.spawn("hero");
    stage
        .add_component(key, "badge", &config(&[("label", "Hero"), ("icon", "gone.svg")]))
        .unwrap();

    let mut source = MapSource::new(&[]);
    stage.pump_assets(&mut source);

    stage.enable(key, "badge").unwrap();
    let badge =
        downcast_object::<Badge>(stage.entity(key).unwrap().attachment("badge").unwrap()).unwrap();
    assert_eq!(badge.label, "Hero");
    assert_eq!(badge.icon, None);
}
