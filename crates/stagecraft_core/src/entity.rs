//! Entities: named containers for component slots and attached objects

use std::collections::BTreeMap;

use slotmap::new_key_type;

use crate::assets::SharedObject;
use crate::component::ComponentSlot;

new_key_type! {
    /// Stable handle to an entity on a [`crate::Stage`]
    pub struct EntityKey;
}

/// A scene entity
///
/// Holds at most one component per type name, plus the objects those
/// components have attached (meshes, sprites, joints). Attachments are
/// keyed by the attaching component's type name, so re-attaching after a
/// late asset load replaces rather than accumulates.
pub struct Entity {
    name: String,
    tags: Vec<String>,
    pub(crate) components: BTreeMap<String, ComponentSlot>,
    attachments: BTreeMap<String, SharedObject>,
}

impl Entity {
    /// Create an empty entity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            components: BTreeMap::new(),
            attachments: BTreeMap::new(),
        }
    }

    /// The entity's display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a tag; duplicates are ignored
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Whether the entity carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The entity's tags in insertion order
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether a component of this type is present
    pub fn has_component(&self, type_name: &str) -> bool {
        self.components.contains_key(type_name)
    }

    /// Type names of all present components, in sorted order
    pub fn component_names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Borrow a component slot
    pub fn component(&self, type_name: &str) -> Option<&ComponentSlot> {
        self.components.get(type_name)
    }

    /// Borrow a component slot mutably
    pub fn component_mut(&mut self, type_name: &str) -> Option<&mut ComponentSlot> {
        self.components.get_mut(type_name)
    }

    /// Attach an object under the given component's name, replacing any
    /// previous attachment from that component.
    pub fn attach(&mut self, component: impl Into<String>, object: SharedObject) {
        self.attachments.insert(component.into(), object);
    }

    /// Remove a component's attachment
    pub fn detach(&mut self, component: &str) -> Option<SharedObject> {
        self.attachments.remove(component)
    }

    /// The object a component has attached, if any
    pub fn attachment(&self, component: &str) -> Option<&SharedObject> {
        self.attachments.get(component)
    }

    /// Number of attached objects
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }
}
