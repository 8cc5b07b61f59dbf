//! Config and parameter values
//!
//! [`Value`] is what scene documents carry for a component field: a plain
//! literal that deserializes from RON without tags. [`ParamValue`] is what
//! schema resolution produces: literals plus resolved enum indices and
//! shared asset objects.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::SharedObject;

/// A literal value supplied by a scene document
///
/// Untagged so scene files read naturally: `true`, `0.5`, `"phong"`,
/// `[1.0, 1.0]`, `[1.0, 0.0, 0.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean literal
    Bool(bool),
    /// Numeric literal (integers are widened; colors are hex numbers)
    Number(f64),
    /// String literal (also used for enum options and asset keys)
    Text(String),
    /// Two-component vector
    Vec2([f32; 2]),
    /// Three-component vector
    Vec3([f32; 3]),
}

impl Value {
    /// Borrow the string content if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the numeric content if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Value::Vec2(v)
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Value::Vec3(v)
    }
}

/// A component config: field name to literal value
pub type ConfigMap = BTreeMap<String, Value>;

/// A resolved parameter, ready to hand to a wrapped-object constructor
#[derive(Clone)]
pub enum ParamValue {
    /// Boolean parameter
    Bool(bool),
    /// Numeric parameter
    Number(f64),
    /// Packed RGB color (0xRRGGBB)
    Color(u32),
    /// String parameter (shader sources, names)
    Text(String),
    /// Two-component vector
    Vec2([f32; 2]),
    /// Three-component vector
    Vec3([f32; 3]),
    /// Enum option resolved to its declared index (offset applied)
    Index(i64),
    /// A loaded asset object shared through the cache
    Object(SharedObject),
}

impl ParamValue {
    /// Convert a config literal into a resolved parameter
    ///
    /// `color` controls whether numbers become [`ParamValue::Color`]
    /// (truncated to 24 bits) or stay plain numbers.
    pub fn from_value(value: &Value, color: bool) -> Self {
        match value {
            Value::Bool(b) => ParamValue::Bool(*b),
            Value::Number(n) if color => ParamValue::Color((*n as u32) & 0x00FF_FFFF),
            Value::Number(n) => ParamValue::Number(*n),
            Value::Text(s) => ParamValue::Text(s.clone()),
            Value::Vec2(v) => ParamValue::Vec2(*v),
            Value::Vec3(v) => ParamValue::Vec3(*v),
        }
    }

    /// Get the numeric content if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean content if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the packed color if this is a color
    pub fn as_color(&self) -> Option<u32> {
        match self {
            ParamValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Borrow the string content if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the resolved enum index if this is an index
    pub fn as_index(&self) -> Option<i64> {
        match self {
            ParamValue::Index(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the vector content if this is a vec2
    pub fn as_vec2(&self) -> Option<[f32; 2]> {
        match self {
            ParamValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the vector content if this is a vec3
    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            ParamValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the shared object if this is a loaded asset
    pub fn as_object(&self) -> Option<&SharedObject> {
        match self {
            ParamValue::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "Bool({})", b),
            ParamValue::Number(n) => write!(f, "Number({})", n),
            ParamValue::Color(c) => write!(f, "Color(#{:06x})", c),
            ParamValue::Text(s) => write!(f, "Text({:?})", s),
            ParamValue::Vec2(v) => write!(f, "Vec2({:?})", v),
            ParamValue::Vec3(v) => write!(f, "Vec3({:?})", v),
            ParamValue::Index(i) => write!(f, "Index({})", i),
            ParamValue::Object(_) => write!(f, "Object(..)"),
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Bool(a), ParamValue::Bool(b)) => a == b,
            (ParamValue::Number(a), ParamValue::Number(b)) => a == b,
            (ParamValue::Color(a), ParamValue::Color(b)) => a == b,
            (ParamValue::Text(a), ParamValue::Text(b)) => a == b,
            (ParamValue::Vec2(a), ParamValue::Vec2(b)) => a == b,
            (ParamValue::Vec3(a), ParamValue::Vec3(b)) => a == b,
            (ParamValue::Index(a), ParamValue::Index(b)) => a == b,
            // Objects compare by identity: components converging on the
            // same cached asset hold the same Arc.
            (ParamValue::Object(a), ParamValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
