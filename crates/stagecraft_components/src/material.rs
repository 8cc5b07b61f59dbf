//! Material component: surface appearance plus the mesh pairing
//!
//! The material component owns the appearance parameters and, on enable,
//! pairs with the entity's enabled `geometry` sibling to build and attach
//! a [`Mesh`]. Either half of the pairing may still be loading; the mesh
//! is then built from a fallback (fully transparent material, unit-box
//! geometry) and rebuilt when the real object arrives.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stagecraft_core::{
    downcast_object, Component, ComponentCtx, ConfigError, FieldSpec, LiteralType, ResolvedParams,
    Schema, SharedObject,
};

use crate::geometry::Geometry;

/// Blending mode options, in index order
pub const BLENDING_MODES: [&str; 6] = [
    "NoBlending",
    "NormalBlending",
    "AdditiveBlending",
    "SubstractiveBlending",
    "MultiplyBlending",
    "CustomBlending",
];

/// Face side options, in index order
pub const SIDES: [&str; 3] = ["FrontSide", "BackSide", "DoubleSide"];

/// Depth packing options; indices carry a fixed offset of 3200
pub const DEPTH_PACKING: [&str; 2] = ["BasicDepthPacking", "RGBADepthPacking"];

/// Index offset applied to depth packing options
pub const DEPTH_PACKING_OFFSET: i64 = 3200;

/// Material kind names, in select index order
pub const MATERIAL_KINDS: [&str; 11] = [
    "asset", "basic", "depth", "lambert", "matcap", "normal", "phong", "physical", "shader",
    "standard", "toon",
];

/// Kinds that accept a diffuse texture map
const TEXTURED_KINDS: [&str; 7] = [
    "basic", "lambert", "matcap", "phong", "physical", "standard", "toon",
];

/// Kinds that carry a base color
const COLORED_KINDS: [&str; 6] = ["basic", "lambert", "phong", "physical", "standard", "toon"];

/// What a material is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Loaded from a material file
    Asset,
    /// Unlit flat color
    Basic,
    /// Depth encoding, for shadow passes
    Depth,
    /// Per-vertex diffuse lighting
    Lambert,
    /// Matcap-textured
    Matcap,
    /// Normal visualization
    Normal,
    /// Phong specular lighting
    Phong,
    /// Physically based, with clearcoat
    Physical,
    /// Custom shader sources
    Shader,
    /// Physically based standard
    Standard,
    /// Toon-banded lighting
    Toon,
}

impl MaterialKind {
    /// Kind from its select index
    pub fn from_index(index: i64) -> Option<Self> {
        use MaterialKind::*;
        [
            Asset, Basic, Depth, Lambert, Matcap, Normal, Phong, Physical, Shader, Standard, Toon,
        ]
        .get(usize::try_from(index).ok()?)
        .copied()
    }

    /// Kind from its name as it appears in configs and material files
    pub fn from_name(name: &str) -> Option<Self> {
        MATERIAL_KINDS
            .iter()
            .position(|k| *k == name)
            .and_then(|i| Self::from_index(i as i64))
    }

    /// The config-facing name
    pub fn name(&self) -> &'static str {
        MATERIAL_KINDS[*self as usize]
    }
}

/// A wrapped material object: the fully resolved appearance state
#[derive(Clone)]
pub struct MaterialObject {
    /// What the material is
    pub kind: MaterialKind,
    /// Base color (0xRRGGBB)
    pub color: u32,
    /// Emissive color (0xRRGGBB)
    pub emissive: u32,
    /// Specular color (0xRRGGBB), phong only
    pub specular: u32,
    /// Surface roughness, physical/standard
    pub roughness: f64,
    /// Metalness, physical/standard
    pub metalness: f64,
    /// Specular exponent, phong
    pub shininess: f64,
    /// Clearcoat layer strength, physical
    pub clearcoat: f64,
    /// Face side (index into [`SIDES`])
    pub side: i64,
    /// Blending mode (index into [`BLENDING_MODES`])
    pub blending: i64,
    /// Depth packing (offset index), depth kind only
    pub depth_packing: Option<i64>,
    /// Whether alpha blending applies
    pub transparent: bool,
    /// Overall opacity
    pub opacity: f64,
    /// Alpha cutoff
    pub alpha_test: f64,
    /// Vertex shader source, shader kind
    pub vertex_shader: Option<String>,
    /// Fragment shader source, shader kind
    pub fragment_shader: Option<String>,
    /// Diffuse texture
    pub map: Option<SharedObject>,
    /// Matcap texture
    pub matcap: Option<SharedObject>,
    /// Normal map texture
    pub normal_map: Option<SharedObject>,
}

impl MaterialObject {
    fn base(kind: MaterialKind) -> Self {
        Self {
            kind,
            color: 0xffffff,
            emissive: 0x000000,
            specular: 0x111111,
            roughness: 1.0,
            metalness: 0.0,
            shininess: 30.0,
            clearcoat: 0.0,
            side: 0,
            blending: 1,
            depth_packing: None,
            transparent: false,
            opacity: 1.0,
            alpha_test: 0.0,
            vertex_shader: None,
            fragment_shader: None,
            map: None,
            matcap: None,
            normal_map: None,
        }
    }

    /// The fallback used while a material file is still loading: fully
    /// transparent, so the paired mesh occupies the scene invisibly.
    pub fn placeholder() -> Self {
        Self {
            transparent: true,
            opacity: 0.0,
            ..Self::base(MaterialKind::Basic)
        }
    }
}

impl fmt::Debug for MaterialObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialObject")
            .field("kind", &self.kind)
            .field("color", &format_args!("#{:06x}", self.color))
            .field("transparent", &self.transparent)
            .field("opacity", &self.opacity)
            .field("map", &self.map.is_some())
            .finish_non_exhaustive()
    }
}

/// A renderable pairing of geometry and material
///
/// Built and attached by the material component; both shadow flags are
/// on, matching how scene meshes are lit.
pub struct Mesh {
    /// The shape
    pub geometry: Arc<Geometry>,
    /// The appearance
    pub material: Arc<MaterialObject>,
    /// Whether the mesh casts shadows
    pub cast_shadow: bool,
    /// Whether the mesh receives shadows
    pub receive_shadow: bool,
}

/// A material file, as parsed by the asset source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDoc {
    /// Kind name; `asset` is not valid inside a file
    pub kind: String,
    /// Base color
    #[serde(default = "default_white")]
    pub color: u32,
    /// Surface roughness
    #[serde(default = "default_one")]
    pub roughness: f64,
    /// Metalness
    #[serde(default)]
    pub metalness: f64,
    /// Whether alpha blending applies
    #[serde(default)]
    pub transparent: bool,
    /// Overall opacity
    #[serde(default = "default_one")]
    pub opacity: f64,
}

fn default_white() -> u32 {
    0xffffff
}

fn default_one() -> f64 {
    1.0
}

impl MaterialDoc {
    /// Build the material object this file describes
    ///
    /// Unrecognized kinds (including `asset`) degrade to `None` with a
    /// warning; the component keeps its placeholder.
    pub fn into_object(&self) -> Option<MaterialObject> {
        let kind = MaterialKind::from_name(&self.kind).filter(|k| *k != MaterialKind::Asset);
        let Some(kind) = kind else {
            log::warn!("Unrecognized material kind '{}' in material file", self.kind);
            return None;
        };
        Some(MaterialObject {
            color: self.color,
            roughness: self.roughness,
            metalness: self.metalness,
            transparent: self.transparent,
            opacity: self.opacity,
            ..MaterialObject::base(kind)
        })
    }
}

/// Schema for the `material` component type
pub fn schema() -> Schema {
    Schema::new()
        .field(FieldSpec::select("type", &MATERIAL_KINDS).with_default("standard"))
        .field(FieldSpec::asset("src").visible_when("type", &["asset"]))
        .field(
            FieldSpec::literal("color", LiteralType::Color)
                .with_default(16777215.0) // 0xffffff
                .visible_when("type", &COLORED_KINDS),
        )
        .field(
            FieldSpec::literal("roughness", LiteralType::Number)
                .with_default(1.0)
                .with_range(0.0, 1.0)
                .visible_when("type", &["physical", "standard"]),
        )
        .field(
            FieldSpec::literal("metalness", LiteralType::Number)
                .with_default(0.0)
                .with_range(0.0, 1.0)
                .visible_when("type", &["physical", "standard"]),
        )
        .field(
            FieldSpec::literal("emissive", LiteralType::Color)
                .with_default(0.0)
                .visible_when("type", &["lambert", "phong", "physical", "standard", "toon"]),
        )
        .field(
            FieldSpec::literal("specular", LiteralType::Color)
                .with_default(1118481.0) // 0x111111
                .visible_when("type", &["phong"]),
        )
        .field(
            FieldSpec::literal("shininess", LiteralType::Number)
                .with_default(30.0)
                .with_range(0.0, 1024.0)
                .visible_when("type", &["phong"]),
        )
        .field(
            FieldSpec::literal("clearcoat", LiteralType::Number)
                .with_default(0.0)
                .with_range(0.0, 1.0)
                .visible_when("type", &["physical"]),
        )
        .field(FieldSpec::asset("map").visible_when("type", &TEXTURED_KINDS))
        .field(FieldSpec::asset("matcap").visible_when("type", &["matcap"]))
        .field(FieldSpec::asset("normal_map").visible_when(
            "type",
            &["lambert", "phong", "physical", "standard", "toon"],
        ))
        .field(FieldSpec::select("side", &SIDES).with_default("FrontSide"))
        .field(FieldSpec::select("blending", &BLENDING_MODES).with_default("NormalBlending"))
        .field(FieldSpec::literal("transparent", LiteralType::Bool).with_default(false))
        .field(
            FieldSpec::literal("opacity", LiteralType::Number)
                .with_default(1.0)
                .with_range(0.0, 1.0),
        )
        .field(
            FieldSpec::literal("alpha_test", LiteralType::Number)
                .with_default(0.0)
                .with_range(0.0, 1.0),
        )
        .field(
            FieldSpec::select("depth_packing", &DEPTH_PACKING)
                .with_default("BasicDepthPacking")
                .with_offset(DEPTH_PACKING_OFFSET)
                .visible_when("type", &["depth"]),
        )
        .field(FieldSpec::literal("vertex_shader", LiteralType::Text).visible_when(
            "type",
            &["shader"],
        ))
        .field(FieldSpec::literal("fragment_shader", LiteralType::Text).visible_when(
            "type",
            &["shader"],
        ))
}

/// The `material` component
#[derive(Default)]
pub struct MaterialComponent {
    /// Appearance built from params, absent until a material file loads
    /// for the `asset` kind
    base: Option<MaterialObject>,
    /// Late-loaded textures by field name
    textures: BTreeMap<String, SharedObject>,
    /// Asset key to the schema field that requested it
    pending_fields: BTreeMap<String, String>,
    material: Option<Arc<MaterialObject>>,
}

impl MaterialComponent {
    fn build_from_params(kind: MaterialKind, params: &ResolvedParams) -> MaterialObject {
        let mut object = MaterialObject::base(kind);
        if let Some(color) = params.get("color").and_then(|p| p.as_color()) {
            object.color = color;
        }
        if let Some(emissive) = params.get("emissive").and_then(|p| p.as_color()) {
            object.emissive = emissive;
        }
        if let Some(specular) = params.get("specular").and_then(|p| p.as_color()) {
            object.specular = specular;
        }
        if let Some(roughness) = params.number("roughness") {
            object.roughness = roughness;
        }
        if let Some(metalness) = params.number("metalness") {
            object.metalness = metalness;
        }
        if let Some(shininess) = params.number("shininess") {
            object.shininess = shininess;
        }
        if let Some(clearcoat) = params.number("clearcoat") {
            object.clearcoat = clearcoat;
        }
        if let Some(side) = params.index("side") {
            object.side = side;
        }
        if let Some(blending) = params.index("blending") {
            object.blending = blending;
        }
        object.depth_packing = params.index("depth_packing");
        if let Some(transparent) = params.boolean("transparent") {
            object.transparent = transparent;
        }
        if let Some(opacity) = params.number("opacity") {
            object.opacity = opacity;
        }
        if let Some(alpha_test) = params.number("alpha_test") {
            object.alpha_test = alpha_test;
        }
        object.vertex_shader = params.text("vertex_shader").map(str::to_string);
        object.fragment_shader = params.text("fragment_shader").map(str::to_string);
        object
    }

    /// Recompose the wrapped object from the base and loaded textures
    fn refresh(&mut self) {
        let Some(base) = self.base.as_ref() else {
            self.material = None;
            return;
        };
        let mut object = base.clone();
        object.map = self.textures.get("map").cloned();
        object.matcap = self.textures.get("matcap").cloned();
        object.normal_map = self.textures.get("normal_map").cloned();
        self.material = Some(Arc::new(object));
    }

    /// Build and attach the mesh, pairing with the geometry sibling
    ///
    /// Requires an enabled `geometry` component on the entity; without
    /// one there is nothing to show and no attach happens. A pending
    /// geometry falls back to a unit box, a pending material to the
    /// transparent placeholder.
    fn attach_mesh(&self, ctx: &mut ComponentCtx) {
        let Some(slot) = ctx.entity.component("geometry") else {
            log::debug!("Material has no geometry sibling; skipping mesh attach");
            return;
        };
        if !slot.is_enabled() {
            log::debug!("Geometry sibling is not enabled; skipping mesh attach");
            return;
        }
        let geometry = slot
            .ref_object()
            .and_then(|object| downcast_object::<Geometry>(&object))
            .unwrap_or_else(|| Arc::new(Geometry::unit_box()));
        let material = self
            .material
            .clone()
            .unwrap_or_else(|| Arc::new(MaterialObject::placeholder()));
        let mesh = Mesh {
            geometry,
            material,
            cast_shadow: true,
            receive_shadow: true,
        };
        ctx.entity.attach("material", Arc::new(mesh) as SharedObject);
    }
}

impl Component for MaterialComponent {
    fn init(&mut self, _ctx: &mut ComponentCtx, params: ResolvedParams) -> Result<(), ConfigError> {
        for pending in params.pending() {
            self.pending_fields
                .insert(pending.key.clone(), pending.field.clone());
        }
        for field in ["map", "matcap", "normal_map"] {
            if let Some(object) = params.get(field).and_then(|p| p.as_object()) {
                self.textures.insert(field.to_string(), object.clone());
            }
        }

        // The select has a default, so "type" always resolves.
        let kind = params
            .index("type")
            .and_then(MaterialKind::from_index)
            .unwrap_or(MaterialKind::Standard);

        if kind == MaterialKind::Asset {
            // Appearance comes from the material file once it loads; the
            // file may already be cached.
            if let Some(object) = params.get("src").and_then(|p| p.as_object()) {
                if let Some(doc) = downcast_object::<MaterialDoc>(object) {
                    self.base = doc.into_object();
                }
            }
        } else {
            self.base = Some(Self::build_from_params(kind, &params));
        }
        self.refresh();
        Ok(())
    }

    fn on_enable(&mut self, ctx: &mut ComponentCtx) {
        self.attach_mesh(ctx);
    }

    fn on_disable(&mut self, ctx: &mut ComponentCtx) {
        ctx.entity.detach("material");
    }

    fn on_load(&mut self, ctx: &mut ComponentCtx, key: &str, object: &SharedObject) {
        let Some(field) = self.pending_fields.remove(key) else {
            return;
        };
        if field == "src" {
            match downcast_object::<MaterialDoc>(object) {
                Some(doc) => self.base = doc.into_object(),
                None => log::warn!("Asset '{}' is not a material file", key),
            }
        } else {
            self.textures.insert(field, object.clone());
        }
        self.refresh();
        if ctx.enabled {
            self.attach_mesh(ctx);
        }
    }

    fn ref_object(&self) -> Option<SharedObject> {
        self.material.clone().map(|m| m as SharedObject)
    }
}
