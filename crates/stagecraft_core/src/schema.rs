//! Declarative component schemas and field resolution
//!
//! A [`Schema`] describes a component's configurable fields: literal
//! parameters, asset references, and enumerated selections, each with an
//! optional default, numeric bounds, and a visibility predicate over an
//! earlier sibling field. [`Schema::resolve`] turns a raw [`ConfigMap`]
//! into the parameter set handed to the wrapped-object constructor,
//! issuing deferred asset loads through the cache on the way.
//!
//! Fields are stored in declaration order, and a visibility predicate may
//! only reference a field declared before it. That invariant is checked
//! once at registration, so resolution can run in a single forward pass.

use crate::assets::{AssetCache, AssetSlot};
use crate::error::ConfigError;
use crate::value::{ConfigMap, ParamValue, Value};
use std::collections::BTreeMap;

/// Shape of a literal field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralType {
    /// Boolean flag
    Bool,
    /// Plain number
    Number,
    /// Packed RGB color supplied as a hex number
    Color,
    /// Two-component vector
    Vec2,
    /// Three-component vector
    Vec3,
    /// Free-form string
    Text,
}

impl LiteralType {
    fn expected(&self) -> &'static str {
        match self {
            LiteralType::Bool => "a boolean",
            LiteralType::Number => "a number",
            LiteralType::Color => "a color (hex number)",
            LiteralType::Vec2 => "a 2-component vector",
            LiteralType::Vec3 => "a 3-component vector",
            LiteralType::Text => "a string",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (LiteralType::Bool, Value::Bool(_))
                | (LiteralType::Number, Value::Number(_))
                | (LiteralType::Color, Value::Number(_))
                | (LiteralType::Vec2, Value::Vec2(_))
                | (LiteralType::Vec3, Value::Vec3(_))
                | (LiteralType::Text, Value::Text(_))
        )
    }
}

/// An enumerated selection: named options mapping to stable indices
///
/// Indices are zero-based in declaration order, shifted by `offset`.
/// The offset exists to line option indices up with an external library's
/// numbering convention and must be carried verbatim, never re-derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSelect {
    options: Vec<String>,
    offset: i64,
}

impl EnumSelect {
    /// Create a selection over the given options, no offset
    pub fn new(options: &[&str]) -> Self {
        Self {
            options: options.iter().map(|s| s.to_string()).collect(),
            offset: 0,
        }
    }

    /// Zero-based position of an option in declaration order
    pub fn position_of(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|o| o == option)
    }

    /// Resolved index of an option (position plus offset)
    pub fn index_of(&self, option: &str) -> Option<i64> {
        self.position_of(option).map(|p| p as i64 + self.offset)
    }

    /// The declared options in order
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The fixed index offset
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

/// How a field's value is interpreted
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A literal copied (type-checked) into the parameters
    Literal(LiteralType),
    /// A key resolved through the asset cache
    Asset,
    /// An enumerated string mapped to its declared index
    Select(EnumSelect),
}

/// Visibility predicate: the field participates only when an earlier
/// sibling holds one of the listed string values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWhen {
    field: String,
    any_of: Vec<String>,
}

/// One configurable field of a component
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    default: Option<Value>,
    min: Option<f64>,
    max: Option<f64>,
    /// Requested index offset; only valid on selects, checked in validate
    offset: Option<i64>,
    when: Option<VisibleWhen>,
}

impl FieldSpec {
    /// A literal field of the given type
    pub fn literal(name: &str, ty: LiteralType) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Literal(ty),
            default: None,
            min: None,
            max: None,
            offset: None,
            when: None,
        }
    }

    /// An asset-reference field
    pub fn asset(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Asset,
            default: None,
            min: None,
            max: None,
            offset: None,
            when: None,
        }
    }

    /// An enumerated selection field
    pub fn select(name: &str, options: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Select(EnumSelect::new(options)),
            default: None,
            min: None,
            max: None,
            offset: None,
            when: None,
        }
    }

    /// Set the default used when the config omits this field
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set inclusive numeric bounds
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Shift this selection's indices by a fixed constant
    ///
    /// Only meaningful on select fields; `Schema::validate` rejects the
    /// offset anywhere else.
    pub fn with_offset(mut self, offset: i64) -> Self {
        if let FieldKind::Select(ref mut select) = self.kind {
            select.offset = offset;
        }
        self.offset = Some(offset);
        self
    }

    /// Restrict visibility to configs where `field` holds one of `any_of`
    pub fn visible_when(mut self, field: &str, any_of: &[&str]) -> Self {
        self.when = Some(VisibleWhen {
            field: field.to_string(),
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// The field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field kind
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// The declared default, if any
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// An asset field whose load is still in flight after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsset {
    /// Schema field that referenced the asset
    pub field: String,
    /// Cache key the load was issued under
    pub key: String,
}

/// The outcome of resolving a config against a schema
#[derive(Debug, Default)]
pub struct ResolvedParams {
    values: BTreeMap<String, ParamValue>,
    pending: Vec<PendingAsset>,
}

impl ResolvedParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a resolved parameter
    pub fn get(&self, field: &str) -> Option<&ParamValue> {
        self.values.get(field)
    }

    /// Insert or replace a parameter (used when late assets arrive)
    pub fn insert(&mut self, field: impl Into<String>, value: ParamValue) {
        self.values.insert(field.into(), value);
    }

    /// Remove a parameter
    pub fn remove(&mut self, field: &str) -> Option<ParamValue> {
        self.values.remove(field)
    }

    /// Numeric parameter shortcut
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(ParamValue::as_number)
    }

    /// Boolean parameter shortcut
    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(ParamValue::as_bool)
    }

    /// Text parameter shortcut
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(ParamValue::as_text)
    }

    /// Enum index parameter shortcut
    pub fn index(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(ParamValue::as_index)
    }

    /// Vec3 parameter shortcut
    pub fn vec3(&self, field: &str) -> Option<[f32; 3]> {
        self.get(field).and_then(ParamValue::as_vec3)
    }

    /// Iterate over resolved parameters in field-name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    /// Number of resolved parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters resolved
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Asset fields still waiting on a load
    pub fn pending(&self) -> &[PendingAsset] {
        &self.pending
    }

    /// Consume the resolved values
    pub fn into_values(self) -> BTreeMap<String, ParamValue> {
        self.values
    }
}

/// Declarative description of a component's configurable fields
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field (declaration order matters for visibility)
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The declared fields in order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check schema consistency
    ///
    /// Run once at registration so resolution never revisits these:
    /// visibility predicates must reference an earlier field, numeric
    /// bounds must be ordered, and select defaults must name a declared
    /// option.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedSchema`] describing the first
    /// inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, field) in self.fields.iter().enumerate() {
            if let Some(ref when) = field.when {
                match self.fields.iter().position(|f| f.name == when.field) {
                    Some(j) if j < i => {}
                    Some(_) => {
                        return Err(ConfigError::MalformedSchema {
                            field: field.name.clone(),
                            detail: format!(
                                "visibility references '{}' which is declared later",
                                when.field
                            ),
                        });
                    }
                    None => {
                        return Err(ConfigError::MalformedSchema {
                            field: field.name.clone(),
                            detail: format!(
                                "visibility references unknown field '{}'",
                                when.field
                            ),
                        });
                    }
                }
            }

            if field.offset.is_some() && !matches!(field.kind, FieldKind::Select(_)) {
                return Err(ConfigError::MalformedSchema {
                    field: field.name.clone(),
                    detail: "index offset on a non-select field".to_string(),
                });
            }

            if let (Some(min), Some(max)) = (field.min, field.max) {
                if min > max {
                    return Err(ConfigError::MalformedSchema {
                        field: field.name.clone(),
                        detail: format!("bounds are inverted ({} > {})", min, max),
                    });
                }
            }

            if let FieldKind::Select(ref select) = field.kind {
                if let Some(ref default) = field.default {
                    let ok = default
                        .as_text()
                        .map(|t| select.position_of(t).is_some())
                        .unwrap_or(false);
                    if !ok {
                        return Err(ConfigError::MalformedSchema {
                            field: field.name.clone(),
                            detail: "select default is not a declared option".to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether a field participates for the given config
    ///
    /// The predicate compares against the effective value of the sibling:
    /// the supplied string if present, the sibling's default otherwise. A
    /// numeric discriminator (the pre-resolved index passthrough) is
    /// mapped back to its option name first, so visibility always agrees
    /// with the index the sibling resolves to.
    fn is_visible(&self, field: &FieldSpec, config: &ConfigMap) -> bool {
        let Some(ref when) = field.when else {
            return true;
        };
        let sibling = self.get(&when.field);
        let effective = match config.get(&when.field) {
            Some(Value::Text(value)) => Some(value.clone()),
            Some(Value::Number(n)) => sibling.and_then(|f| match f.kind() {
                FieldKind::Select(select) => usize::try_from(*n as i64 - select.offset())
                    .ok()
                    .and_then(|position| select.options().get(position).cloned()),
                _ => None,
            }),
            _ => sibling
                .and_then(FieldSpec::default)
                .and_then(Value::as_text)
                .map(str::to_string),
        };
        match effective {
            Some(value) => when.any_of.iter().any(|o| *o == value),
            None => false,
        }
    }

    /// Resolve a config against this schema
    ///
    /// For each visible field: literals are type- and bounds-checked,
    /// selections map their string to the declared index plus offset, and
    /// asset references resolve through `assets` (misses create a pending
    /// cache entry immediately and are reported in
    /// [`ResolvedParams::pending`]). Absent fields fall back to their
    /// default; fields whose visibility predicate fails are ignored even
    /// when supplied.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unknown config keys, type
    /// mismatches, out-of-range numbers, and unrecognized options.
    pub fn resolve(
        &self,
        config: &ConfigMap,
        assets: &mut AssetCache,
    ) -> Result<ResolvedParams, ConfigError> {
        for key in config.keys() {
            if self.get(key).is_none() {
                return Err(ConfigError::UnknownField(key.clone()));
            }
        }

        let mut params = ResolvedParams::new();

        for field in &self.fields {
            if !self.is_visible(field, config) {
                continue;
            }
            let supplied = config.get(&field.name);

            match &field.kind {
                FieldKind::Literal(ty) => {
                    let value = match supplied {
                        Some(value) => {
                            if !ty.matches(value) {
                                return Err(ConfigError::InvalidValue {
                                    field: field.name.clone(),
                                    expected: ty.expected(),
                                });
                            }
                            value
                        }
                        None => match field.default.as_ref() {
                            Some(default) => default,
                            None => continue,
                        },
                    };
                    if let (Value::Number(n), Some(min), Some(max)) =
                        (value, field.min, field.max)
                    {
                        if *n < min || *n > max {
                            return Err(ConfigError::OutOfRange {
                                field: field.name.clone(),
                                value: *n,
                                min,
                                max,
                            });
                        }
                    }
                    params.insert(
                        field.name.clone(),
                        ParamValue::from_value(value, *ty == LiteralType::Color),
                    );
                }

                FieldKind::Select(select) => {
                    let effective = supplied.or(field.default.as_ref());
                    match effective {
                        Some(Value::Text(option)) => {
                            let index = select.index_of(option).ok_or_else(|| {
                                ConfigError::InvalidOption {
                                    field: field.name.clone(),
                                    value: option.clone(),
                                }
                            })?;
                            params.insert(field.name.clone(), ParamValue::Index(index));
                        }
                        // Pre-resolved numeric indices pass through as-is.
                        Some(Value::Number(n)) => {
                            params.insert(field.name.clone(), ParamValue::Index(*n as i64));
                        }
                        Some(_) => {
                            return Err(ConfigError::InvalidValue {
                                field: field.name.clone(),
                                expected: "an option name",
                            });
                        }
                        None => continue,
                    }
                }

                FieldKind::Asset => {
                    let key = match supplied.or(field.default.as_ref()) {
                        Some(Value::Text(key)) => key,
                        Some(_) => {
                            return Err(ConfigError::InvalidValue {
                                field: field.name.clone(),
                                expected: "an asset key string",
                            });
                        }
                        None => continue,
                    };
                    if key.is_empty() {
                        continue;
                    }
                    match assets.request(key) {
                        AssetSlot::Ready(object) => {
                            params.insert(field.name.clone(), ParamValue::Object(object));
                        }
                        AssetSlot::Pending => {
                            params.pending.push(PendingAsset {
                                field: field.name.clone(),
                                key: key.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(params)
    }
}
