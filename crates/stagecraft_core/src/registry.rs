//! Component type registry
//!
//! Maps a component type name to its declarative schema and a factory
//! for fresh instances. Registration validates the schema once, so every
//! later instantiation can trust it.

use std::collections::HashMap;

use crate::component::Component;
use crate::error::ConfigError;
use crate::schema::Schema;

type Factory = Box<dyn Fn() -> Box<dyn Component>>;

struct ComponentDef {
    schema: Schema,
    factory: Factory,
}

/// Registry of component types known to a stage
#[derive(Default)]
pub struct ComponentRegistry {
    defs: HashMap<String, ComponentDef>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type under a unique name
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateType`] if the name is taken and
    /// [`ConfigError::MalformedSchema`] if the schema is inconsistent.
    pub fn register(
        &mut self,
        name: &str,
        schema: Schema,
        factory: impl Fn() -> Box<dyn Component> + 'static,
    ) -> Result<(), ConfigError> {
        if self.defs.contains_key(name) {
            return Err(ConfigError::DuplicateType(name.to_string()));
        }
        schema.validate()?;
        log::debug!("Registered component type '{}'", name);
        self.defs.insert(
            name.to_string(),
            ComponentDef {
                schema,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    /// Whether a type name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// The schema registered for a type
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for unregistered names.
    pub fn schema_of(&self, name: &str) -> Result<&Schema, ConfigError> {
        self.defs
            .get(name)
            .map(|def| &def.schema)
            .ok_or_else(|| ConfigError::UnknownType(name.to_string()))
    }

    /// Create a fresh, uninitialized instance of a registered type
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for unregistered names.
    pub fn create(&self, name: &str) -> Result<Box<dyn Component>, ConfigError> {
        self.defs
            .get(name)
            .map(|def| (def.factory)())
            .ok_or_else(|| ConfigError::UnknownType(name.to_string()))
    }

    /// Registered type names, in arbitrary order
    pub fn type_names(&self) -> Vec<&str> {
        self.defs.keys().map(String::as_str).collect()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
