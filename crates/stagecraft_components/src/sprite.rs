//! Vector sprite component
//!
//! Wraps a vector document (paths with fill and stroke styles) loaded
//! through the asset source and builds a [`SpriteGroup`]: one mesh per
//! filled path and one per stroked path, double-sided, without depth
//! writes. The group's Y scale is negated because vector documents use a
//! top-left origin while the scene is Y-up.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stagecraft_core::{
    downcast_object, Component, ComponentCtx, ConfigError, FieldSpec, ResolvedParams, Schema,
    SharedObject,
};

/// One path of a vector document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPath {
    /// Polyline points in document space
    pub points: Vec<[f32; 2]>,
    /// Fill color as `#rrggbb`, absent for unfilled paths
    #[serde(default)]
    pub fill: Option<String>,
    /// Stroke color as `#rrggbb`, absent for unstroked paths
    #[serde(default)]
    pub stroke: Option<String>,
    /// Stroke width in document units
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
}

fn default_stroke_width() -> f32 {
    1.0
}

/// A parsed vector document, as produced by the asset source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDoc {
    /// Document width
    pub width: f32,
    /// Document height
    pub height: f32,
    /// Paths in draw order
    pub paths: Vec<VectorPath>,
}

/// One renderable piece of a sprite
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteMesh {
    /// Packed color (0xRRGGBB)
    pub color: u32,
    /// Vertex count of the triangulated piece
    pub vertex_count: usize,
    /// Sprites render from both sides
    pub double_sided: bool,
    /// Sprites never write depth
    pub depth_write: bool,
}

/// The wrapped object a vector sprite exposes
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteGroup {
    /// Meshes for filled paths, in draw order
    pub fills: Vec<SpriteMesh>,
    /// Meshes for stroked paths, in draw order
    pub strokes: Vec<SpriteMesh>,
    /// Group scale; Y is negated to flip the document origin
    pub scale: [f32; 3],
}

/// Parse a `#rrggbb` style color
fn parse_color(text: &str) -> Option<u32> {
    let hex = text.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Build a sprite group from a parsed document
pub fn build_sprite(doc: &VectorDoc) -> SpriteGroup {
    let mut fills = Vec::new();
    let mut strokes = Vec::new();

    for path in &doc.paths {
        if path.points.len() < 2 {
            continue;
        }
        if let Some(color) = path.fill.as_deref().and_then(parse_color) {
            // Fan triangulation of the closed outline.
            let triangles = path.points.len().saturating_sub(2);
            fills.push(SpriteMesh {
                color,
                vertex_count: triangles * 3,
                double_sided: true,
                depth_write: false,
            });
        }
        if let Some(color) = path.stroke.as_deref().and_then(parse_color) {
            // Two triangles per segment of the stroke ribbon.
            let segments = path.points.len() - 1;
            strokes.push(SpriteMesh {
                color,
                vertex_count: segments * 6,
                double_sided: true,
                depth_write: false,
            });
        }
    }

    SpriteGroup {
        fills,
        strokes,
        scale: [1.0, -1.0, 1.0],
    }
}

/// Schema for the `sprite` component type
pub fn schema() -> Schema {
    Schema::new().field(FieldSpec::asset("src"))
}

/// The `sprite` component
#[derive(Default)]
pub struct SpriteComponent {
    group: Option<Arc<SpriteGroup>>,
}

impl SpriteComponent {
    fn set_doc(&mut self, key: &str, object: &SharedObject) {
        match downcast_object::<VectorDoc>(object) {
            Some(doc) => self.group = Some(Arc::new(build_sprite(&doc))),
            None => log::warn!("Asset '{}' is not a vector document", key),
        }
    }

    fn attach(&self, ctx: &mut ComponentCtx) {
        if let Some(group) = &self.group {
            ctx.entity
                .attach("sprite", group.clone() as SharedObject);
        }
    }
}

impl Component for SpriteComponent {
    fn init(&mut self, _ctx: &mut ComponentCtx, params: ResolvedParams) -> Result<(), ConfigError> {
        if let Some(object) = params.get("src").and_then(|p| p.as_object()) {
            let object = object.clone();
            self.set_doc("src", &object);
        }
        Ok(())
    }

    fn on_enable(&mut self, ctx: &mut ComponentCtx) {
        self.attach(ctx);
    }

    fn on_disable(&mut self, ctx: &mut ComponentCtx) {
        ctx.entity.detach("sprite");
    }

    fn on_load(&mut self, ctx: &mut ComponentCtx, key: &str, object: &SharedObject) {
        self.set_doc(key, object);
        if ctx.enabled {
            self.attach(ctx);
        }
    }

    fn ref_object(&self) -> Option<SharedObject> {
        self.group.clone().map(|g| g as SharedObject)
    }
}
