//! Geometry component: primitive shapes with conditional dimension fields
//!
//! The component only builds and exposes the wrapped [`Geometry`]; the
//! mesh that combines it with a material is attached by the material
//! component of the same entity.

use std::sync::Arc;

use stagecraft_core::{
    Component, ComponentCtx, ConfigError, FieldSpec, LiteralType, ResolvedParams, Schema,
    SharedObject,
};

/// Primitive shape parameters
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryKind {
    /// Axis-aligned box
    Box {
        /// Extent along X
        width: f64,
        /// Extent along Y
        height: f64,
        /// Extent along Z
        depth: f64,
    },
    /// UV sphere
    Sphere {
        /// Sphere radius
        radius: f64,
        /// Subdivision count around and along the sphere
        segments: u32,
    },
    /// Flat plane in XY
    Plane {
        /// Extent along X
        width: f64,
        /// Extent along Y
        height: f64,
    },
    /// Capped cylinder along Y
    Cylinder {
        /// Radius at the top cap
        radius_top: f64,
        /// Radius at the bottom cap
        radius_bottom: f64,
        /// Extent along Y
        height: f64,
        /// Subdivision count around the axis
        segments: u32,
    },
}

/// A wrapped geometry object
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// The primitive and its dimensions
    pub kind: GeometryKind,
}

impl Geometry {
    /// The fallback used when a mesh is built before a real geometry is
    /// available: a unit box.
    pub fn unit_box() -> Self {
        Self {
            kind: GeometryKind::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            },
        }
    }
}

/// Schema for the `geometry` component type
pub fn schema() -> Schema {
    Schema::new()
        .field(
            FieldSpec::select("type", &["box", "sphere", "plane", "cylinder"])
                .with_default("box"),
        )
        .field(
            FieldSpec::literal("width", LiteralType::Number)
                .with_default(1.0)
                .visible_when("type", &["box", "plane"]),
        )
        .field(
            FieldSpec::literal("height", LiteralType::Number)
                .with_default(1.0)
                .visible_when("type", &["box", "plane", "cylinder"]),
        )
        .field(
            FieldSpec::literal("depth", LiteralType::Number)
                .with_default(1.0)
                .visible_when("type", &["box"]),
        )
        .field(
            FieldSpec::literal("radius", LiteralType::Number)
                .with_default(0.5)
                .visible_when("type", &["sphere"]),
        )
        .field(
            FieldSpec::literal("radius_top", LiteralType::Number)
                .with_default(0.5)
                .visible_when("type", &["cylinder"]),
        )
        .field(
            FieldSpec::literal("radius_bottom", LiteralType::Number)
                .with_default(0.5)
                .visible_when("type", &["cylinder"]),
        )
        .field(
            FieldSpec::literal("segments", LiteralType::Number)
                .with_default(16.0)
                .with_range(3.0, 256.0)
                .visible_when("type", &["sphere", "cylinder"]),
        )
}

/// The `geometry` component
#[derive(Default)]
pub struct GeometryComponent {
    geometry: Option<Arc<Geometry>>,
}

impl GeometryComponent {
    /// The wrapped geometry, typed
    pub fn geometry(&self) -> Option<&Arc<Geometry>> {
        self.geometry.as_ref()
    }
}

impl Component for GeometryComponent {
    fn init(&mut self, _ctx: &mut ComponentCtx, params: ResolvedParams) -> Result<(), ConfigError> {
        // "type" always resolves: the select has a default.
        let kind = match params.index("type").unwrap_or(0) {
            0 => GeometryKind::Box {
                width: params.number("width").unwrap_or(1.0),
                height: params.number("height").unwrap_or(1.0),
                depth: params.number("depth").unwrap_or(1.0),
            },
            1 => GeometryKind::Sphere {
                radius: params.number("radius").unwrap_or(0.5),
                segments: params.number("segments").unwrap_or(16.0) as u32,
            },
            2 => GeometryKind::Plane {
                width: params.number("width").unwrap_or(1.0),
                height: params.number("height").unwrap_or(1.0),
            },
            3 => GeometryKind::Cylinder {
                radius_top: params.number("radius_top").unwrap_or(0.5),
                radius_bottom: params.number("radius_bottom").unwrap_or(0.5),
                height: params.number("height").unwrap_or(1.0),
                segments: params.number("segments").unwrap_or(16.0) as u32,
            },
            other => {
                log::warn!("Unrecognized geometry kind index {}, keeping no shape", other);
                return Ok(());
            }
        };
        self.geometry = Some(Arc::new(Geometry { kind }));
        Ok(())
    }

    fn ref_object(&self) -> Option<SharedObject> {
        self.geometry.clone().map(|g| g as SharedObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_core::{downcast_object, ComponentRegistry, ConfigMap, Stage, Value};

    fn stage() -> Stage {
        let mut registry = ComponentRegistry::new();
        registry
            .register("geometry", schema(), || Box::<GeometryComponent>::default())
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
    fn test_default_is_unit_box() {
        let mut stage = stage();
        let key = stage.spawn("e");
        stage.add_component(key, "geometry", &ConfigMap::new()).unwrap();

        let object = stage.ref_object(key, "geometry").unwrap();
        let geometry = downcast_object::<Geometry>(&object).unwrap();
        assert_eq!(*geometry, Geometry::unit_box());
    }

    #[test]
    fn test_sphere_dimensions() {
        let mut stage = stage();
        let key = stage.spawn("e");
        stage
            .add_component(
                key,
                "geometry",
                &config(&[
                    ("type", Value::from("sphere")),
                    ("radius", Value::Number(2.0)),
                    ("segments", Value::Number(32.0)),
                ]),
            )
            .unwrap();

        let geometry =
            downcast_object::<Geometry>(&stage.ref_object(key, "geometry").unwrap()).unwrap();
        assert_eq!(
            geometry.kind,
            GeometryKind::Sphere {
                radius: 2.0,
                segments: 32
            }
        );
    }

    #[test]
    fn test_box_dimensions_ignored_for_sphere() {
        let mut stage = stage();
        let key = stage.spawn("e");
        // depth is invisible for spheres; supplying it is not an error.
        stage
            .add_component(
                key,
                "geometry",
                &config(&[
                    ("type", Value::from("sphere")),
                    ("depth", Value::Number(9.0)),
                ]),
            )
            .unwrap();

        let geometry =
            downcast_object::<Geometry>(&stage.ref_object(key, "geometry").unwrap()).unwrap();
        assert!(matches!(geometry.kind, GeometryKind::Sphere { .. }));
    }

    #[test]
    fn test_segments_bounds_enforced() {
        let mut stage = stage();
        let key = stage.spawn("e");
        let err = stage
            .add_component(
                key,
                "geometry",
                &config(&[
                    ("type", Value::from("sphere")),
                    ("segments", Value::Number(2.0)),
                ]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            stagecraft_core::StageError::Config(ConfigError::OutOfRange { .. })
        ));
    }
}
