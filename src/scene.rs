//! Scene documents
//!
//! A scene is a RON file listing entities, their tags, and their
//! component configs. Loading is split into parse, static validation
//! against a registry, and instantiation onto a stage; validation
//! failures name the offending entity so scene files are debuggable
//! without a stack trace.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use stagecraft_core::{ComponentRegistry, ConfigMap, EntityKey, Stage, StageError};

/// One component entry of an entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDoc {
    /// Registered component type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the component is enabled right after instantiation
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Raw field values resolved against the component's schema
    #[serde(default)]
    pub config: ConfigMap,
}

fn default_enabled() -> bool {
    true
}

/// One entity of a scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDoc {
    /// Unique entity name within the scene
    pub name: String,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Components in instantiation order
    #[serde(default)]
    pub components: Vec<ComponentDoc>,
}

/// A loadable scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDoc {
    /// Scene name, for logs
    pub name: String,
    /// Entities in spawn order
    #[serde(default)]
    pub entities: Vec<EntityDoc>,
}

/// Error loading or instantiating a scene
#[derive(Debug)]
pub enum SceneError {
    /// Could not read the scene file
    Read(io::Error),
    /// The file is not a valid scene document
    Parse(String),
    /// The document failed static validation
    Invalid(String),
    /// Instantiation failed on the stage
    Stage(StageError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Read(err) => write!(f, "Failed to read scene: {}", err),
            SceneError::Parse(msg) => write!(f, "Failed to parse scene: {}", msg),
            SceneError::Invalid(msg) => write!(f, "Invalid scene: {}", msg),
            SceneError::Stage(err) => write!(f, "Failed to instantiate scene: {}", err),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Read(err) => Some(err),
            SceneError::Stage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SceneError {
    fn from(err: io::Error) -> Self {
        SceneError::Read(err)
    }
}

impl From<StageError> for SceneError {
    fn from(err: StageError) -> Self {
        SceneError::Stage(err)
    }
}

impl SceneDoc {
    /// Parse a scene from RON text
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Parse`] with the RON diagnostic.
    pub fn from_str(text: &str) -> Result<Self, SceneError> {
        ron::from_str(text).map_err(|e| SceneError::Parse(e.to_string()))
    }

    /// Read and parse a scene file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let text = fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// Serialize back to RON, pretty-printed
    pub fn to_ron(&self) -> Result<String, SceneError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::Parse(e.to_string()))
    }

    /// Statically validate the document against a registry
    ///
    /// Checks, in order: the scene has at least one entity, entity names
    /// are unique, no entity lists a component type twice, and every
    /// component type is registered.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Invalid`] naming the first problem found.
    pub fn validate(&self, registry: &ComponentRegistry) -> Result<(), SceneError> {
        if self.entities.is_empty() {
            return Err(SceneError::Invalid(format!(
                "scene '{}' has no entities",
                self.name
            )));
        }

        let mut seen_names = Vec::new();
        for entity in &self.entities {
            if seen_names.contains(&entity.name.as_str()) {
                return Err(SceneError::Invalid(format!(
                    "duplicate entity name '{}'",
                    entity.name
                )));
            }
            seen_names.push(entity.name.as_str());

            let mut seen_types = Vec::new();
            for component in &entity.components {
                if seen_types.contains(&component.type_name.as_str()) {
                    return Err(SceneError::Invalid(format!(
                        "entity '{}' lists component '{}' twice",
                        entity.name, component.type_name
                    )));
                }
                seen_types.push(component.type_name.as_str());

                if !registry.contains(&component.type_name) {
                    return Err(SceneError::Invalid(format!(
                        "entity '{}' uses unknown component type '{}'",
                        entity.name, component.type_name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Instantiate the scene onto a stage
    ///
    /// Validates first, then spawns every entity, adds its components in
    /// document order, and enables those marked enabled. Deferred asset
    /// loads are queued on the stage's cache; call `Stage::pump_assets`
    /// afterwards to resolve them.
    ///
    /// # Errors
    ///
    /// Returns the validation error, or the first instantiation error.
    /// Entities spawned before the failure stay on the stage.
    pub fn instantiate(&self, stage: &mut Stage) -> Result<Vec<EntityKey>, SceneError> {
        self.validate(stage.registry())?;
        log::info!(
            "Instantiating scene '{}' ({} entities)",
            self.name,
            self.entities.len()
        );

        let mut keys = Vec::with_capacity(self.entities.len());
        for entity_doc in &self.entities {
            let key = stage.spawn(entity_doc.name.clone());
            if let Some(entity) = stage.entity_mut(key) {
                for tag in &entity_doc.tags {
                    entity.add_tag(tag.clone());
                }
            }

            for component in &entity_doc.components {
                stage.add_component(key, &component.type_name, &component.config)?;
                if component.enabled {
                    stage
                        .enable(key, &component.type_name)
                        .map_err(|e| SceneError::Stage(e.into()))?;
                }
            }
            keys.push(key);
        }
        Ok(keys)
    }
}
