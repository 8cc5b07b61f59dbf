//! Physics joint component
//!
//! Joints are described by a single [`JointSpec`] with a tagged
//! [`JointKind`] rather than a hierarchy of joint types; one dispatch
//! function builds the per-kind descriptor from the resolved config.
//! The spec is the wrapped object; feeding it to a physics backend is
//! out of scope here.

use std::f64::consts::PI;
use std::sync::Arc;

use stagecraft_core::{
    Component, ComponentCtx, ConfigError, FieldSpec, LiteralType, ResolvedParams, Schema,
    SharedObject,
};

/// A spring and its damping, as one unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringDamper {
    /// Spring stiffness
    pub spring: f64,
    /// Damping coefficient
    pub damper: f64,
}

/// An angular range in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularLimit {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

/// Per-kind joint parameters
#[derive(Debug, Clone, PartialEq)]
pub enum JointKind {
    /// Point-to-point joint with a restoring spring
    Ball {
        /// Restoring spring on the connection
        spring: SpringDamper,
    },
    /// Cone-and-twist joint for limb chains
    Ragdoll {
        /// Axis the limb twists around, in local space
        twist_axis: [f32; 3],
        /// Reference axis for the swing cone, in local space
        swing_axis: [f32; 3],
        /// Maximum swing angles around the two cone directions
        max_swing: [f64; 2],
        /// Spring applied to swing deflection
        swing_spring: SpringDamper,
        /// Spring applied to twist deflection
        twist_spring: SpringDamper,
        /// Allowed twist range
        twist_limit: AngularLimit,
    },
}

/// A complete joint descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct JointSpec {
    /// Anchor point in the owning entity's local space
    pub anchor: [f32; 3],
    /// Name of the entity the joint connects to
    pub target: String,
    /// Whether the two connected bodies may still collide
    pub allow_collision: bool,
    /// Force above which the joint breaks, unbreakable when absent
    pub break_force: Option<f64>,
    /// Torque above which the joint breaks, unbreakable when absent
    pub break_torque: Option<f64>,
    /// Kind-specific parameters
    pub kind: JointKind,
}

/// Schema for the `joint` component type
pub fn schema() -> Schema {
    Schema::new()
        .field(FieldSpec::select("type", &["ball", "ragdoll"]).with_default("ball"))
        .field(FieldSpec::literal("target", LiteralType::Text).with_default(""))
        .field(
            FieldSpec::literal("anchor", LiteralType::Vec3).with_default([0.0f32, 0.0, 0.0]),
        )
        .field(FieldSpec::literal("allow_collision", LiteralType::Bool).with_default(false))
        .field(FieldSpec::literal("break_force", LiteralType::Number))
        .field(FieldSpec::literal("break_torque", LiteralType::Number))
        .field(
            FieldSpec::literal("spring", LiteralType::Number)
                .with_default(0.0)
                .visible_when("type", &["ball"]),
        )
        .field(
            FieldSpec::literal("damper", LiteralType::Number)
                .with_default(0.0)
                .visible_when("type", &["ball"]),
        )
        .field(
            FieldSpec::literal("twist_axis", LiteralType::Vec3)
                .with_default([1.0f32, 0.0, 0.0])
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("swing_axis", LiteralType::Vec3)
                .with_default([0.0f32, 1.0, 0.0])
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("max_swing1", LiteralType::Number)
                .with_default(PI)
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("max_swing2", LiteralType::Number)
                .with_default(PI)
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("swing_spring", LiteralType::Number)
                .with_default(0.0)
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("swing_damper", LiteralType::Number)
                .with_default(0.0)
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("twist_spring", LiteralType::Number)
                .with_default(0.0)
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("twist_damper", LiteralType::Number)
                .with_default(0.0)
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("twist_min", LiteralType::Number)
                .with_default(-PI)
                .visible_when("type", &["ragdoll"]),
        )
        .field(
            FieldSpec::literal("twist_max", LiteralType::Number)
                .with_default(PI)
                .visible_when("type", &["ragdoll"]),
        )
}

/// Build the joint descriptor for the resolved parameters
///
/// The single dispatch point over joint kinds: everything common lands in
/// [`JointSpec`], everything per-kind in its [`JointKind`] variant.
pub fn build_joint(params: &ResolvedParams) -> Option<JointSpec> {
    let kind = match params.index("type")? {
        0 => JointKind::Ball {
            spring: SpringDamper {
                spring: params.number("spring").unwrap_or(0.0),
                damper: params.number("damper").unwrap_or(0.0),
            },
        },
        1 => JointKind::Ragdoll {
            twist_axis: params.vec3("twist_axis").unwrap_or([1.0, 0.0, 0.0]),
            swing_axis: params.vec3("swing_axis").unwrap_or([0.0, 1.0, 0.0]),
            max_swing: [
                params.number("max_swing1").unwrap_or(PI),
                params.number("max_swing2").unwrap_or(PI),
            ],
            swing_spring: SpringDamper {
                spring: params.number("swing_spring").unwrap_or(0.0),
                damper: params.number("swing_damper").unwrap_or(0.0),
            },
            twist_spring: SpringDamper {
                spring: params.number("twist_spring").unwrap_or(0.0),
                damper: params.number("twist_damper").unwrap_or(0.0),
            },
            twist_limit: AngularLimit {
                min: params.number("twist_min").unwrap_or(-PI),
                max: params.number("twist_max").unwrap_or(PI),
            },
        },
        other => {
            log::warn!("Unrecognized joint kind index {}, keeping no joint", other);
            return None;
        }
    };

    Some(JointSpec {
        anchor: params.vec3("anchor").unwrap_or([0.0, 0.0, 0.0]),
        target: params.text("target").unwrap_or("").to_string(),
        allow_collision: params.boolean("allow_collision").unwrap_or(false),
        break_force: params.number("break_force"),
        break_torque: params.number("break_torque"),
        kind,
    })
}

/// The `joint` component
#[derive(Default)]
pub struct JointComponent {
    joint: Option<Arc<JointSpec>>,
}

impl Component for JointComponent {
    fn init(&mut self, _ctx: &mut ComponentCtx, params: ResolvedParams) -> Result<(), ConfigError> {
        self.joint = build_joint(&params).map(Arc::new);
        Ok(())
    }

    fn on_enable(&mut self, ctx: &mut ComponentCtx) {
        if let Some(joint) = &self.joint {
            ctx.entity.attach("joint", joint.clone() as SharedObject);
        }
    }

    fn on_disable(&mut self, ctx: &mut ComponentCtx) {
        ctx.entity.detach("joint");
    }

    fn ref_object(&self) -> Option<SharedObject> {
        self.joint.clone().map(|j| j as SharedObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_core::{downcast_object, ComponentRegistry, ConfigMap, Stage, Value};

    fn joint_stage() -> Stage {
        let mut registry = ComponentRegistry::new();
        registry
            .register("joint", schema(), || Box::<JointComponent>::default())
            .unwrap();
        Stage::new(registry)
    }

    fn config(pairs: &[(&str, Value)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn joint_of(stage: &Stage, key: stagecraft_core::EntityKey) -> Arc<JointSpec> {
        downcast_object::<JointSpec>(&stage.ref_object(key, "joint").unwrap()).unwrap()
    }

    #[test]
    fn test_ball_joint_dispatch() {
        let mut stage = joint_stage();
        let key = stage.spawn("limb");
        stage
            .add_component(
                key,
                "joint",
                &config(&[
                    ("target", Value::from("torso")),
                    ("anchor", Value::Vec3([0.0, 1.0, 0.0])),
                    ("spring", Value::Number(50.0)),
                    ("damper", Value::Number(5.0)),
                    ("break_force", Value::Number(1000.0)),
                ]),
            )
            .unwrap();

        let joint = joint_of(&stage, key);
        assert_eq!(joint.target, "torso");
        assert_eq!(joint.anchor, [0.0, 1.0, 0.0]);
        assert_eq!(joint.break_force, Some(1000.0));
        assert_eq!(joint.break_torque, None);
        assert!(!joint.allow_collision);
        assert_eq!(
            joint.kind,
            JointKind::Ball {
                spring: SpringDamper {
                    spring: 50.0,
                    damper: 5.0
                }
            }
        );
    }

    #[test]
    fn test_ragdoll_joint_defaults() {
        let mut stage = joint_stage();
        let key = stage.spawn("limb");
        stage
            .add_component(key, "joint", &config(&[("type", Value::from("ragdoll"))]))
            .unwrap();

        let joint = joint_of(&stage, key);
        match &joint.kind {
            JointKind::Ragdoll {
                twist_axis,
                swing_axis,
                max_swing,
                twist_limit,
                ..
            } => {
                assert_eq!(*twist_axis, [1.0, 0.0, 0.0]);
                assert_eq!(*swing_axis, [0.0, 1.0, 0.0]);
                assert_eq!(*max_swing, [PI, PI]);
                assert_eq!(*twist_limit, AngularLimit { min: -PI, max: PI });
            }
            other => panic!("Expected ragdoll kind, got {:?}", other),
        }
    }

    #[test]
    fn test_ball_fields_invisible_for_ragdoll() {
        let mut stage = joint_stage();
        let key = stage.spawn("limb");
        // "spring" belongs to ball joints; ignored for ragdoll.
        stage
            .add_component(
                key,
                "joint",
                &config(&[
                    ("type", Value::from("ragdoll")),
                    ("spring", Value::Number(99.0)),
                ]),
            )
            .unwrap();
        assert!(matches!(joint_of(&stage, key).kind, JointKind::Ragdoll { .. }));
    }

    #[test]
    fn test_joint_attach_detach() {
        let mut stage = joint_stage();
        let key = stage.spawn("limb");
        stage.add_component(key, "joint", &ConfigMap::new()).unwrap();

        stage.enable(key, "joint").unwrap();
        assert!(stage.entity(key).unwrap().attachment("joint").is_some());

        stage.disable(key, "joint").unwrap();
        assert!(stage.entity(key).unwrap().attachment("joint").is_none());
    }
}
