//! Built-in component types for stagecraft
//!
//! Four component families, each a module exporting its schema, its
//! wrapped object types, and the `Component` implementation:
//!
//! - [`material`] - surface appearance and the mesh pairing
//! - [`geometry`] - primitive shapes
//! - [`sprite`] - vector-document sprites
//! - [`joints`] - physics joint descriptors
//!
//! [`register_builtin`] installs all of them into a registry under their
//! canonical type names.

pub mod geometry;
pub mod joints;
pub mod material;
pub mod sprite;

use stagecraft_core::{ComponentRegistry, ConfigError};

use geometry::GeometryComponent;
use joints::JointComponent;
use material::MaterialComponent;
use sprite::SpriteComponent;

/// Register every built-in component type
///
/// Type names: `material`, `geometry`, `sprite`, `joint`.
///
/// # Errors
///
/// Returns [`ConfigError::DuplicateType`] if any of the names is taken.
pub fn register_builtin(registry: &mut ComponentRegistry) -> Result<(), ConfigError> {
    registry.register("material", material::schema(), || {
        Box::<MaterialComponent>::default()
    })?;
    registry.register("geometry", geometry::schema(), || {
        Box::<GeometryComponent>::default()
    })?;
    registry.register("sprite", sprite::schema(), || {
        Box::<SpriteComponent>::default()
    })?;
    registry.register("joint", joints::schema(), || {
        Box::<JointComponent>::default()
    })?;
    Ok(())
}
