//! Error types for the component layer
//!
//! Three families: [`ConfigError`] is fatal at registration or
//! instantiation time and is always surfaced to the caller,
//! [`AssetError`] is non-fatal and reaches components as an `error`
//! event, and [`LifecycleError`] reports invalid state transitions.

use std::fmt;
use std::io;

/// Fatal configuration error, surfaced at registration or instantiation.
#[derive(Debug)]
pub enum ConfigError {
    /// Component type name is not registered
    UnknownType(String),
    /// Component type name is already registered
    DuplicateType(String),
    /// The declared schema is inconsistent (forward visibility reference,
    /// bad select default, offset on a non-select field)
    MalformedSchema {
        /// Field that triggered the check
        field: String,
        /// What was wrong with it
        detail: String,
    },
    /// Config key does not exist in the component's schema
    UnknownField(String),
    /// Config value has the wrong shape for its field
    InvalidValue {
        /// Offending field
        field: String,
        /// What the schema expects
        expected: &'static str,
    },
    /// String value is not one of the field's declared options
    InvalidOption {
        /// Offending field
        field: String,
        /// The unrecognized option string
        value: String,
    },
    /// Numeric value falls outside the field's declared bounds
    OutOfRange {
        /// Offending field
        field: String,
        /// The supplied value
        value: f64,
        /// Lower bound (inclusive)
        min: f64,
        /// Upper bound (inclusive)
        max: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownType(name) => write!(f, "Unknown component type: '{}'", name),
            ConfigError::DuplicateType(name) => {
                write!(f, "Component type already registered: '{}'", name)
            }
            ConfigError::MalformedSchema { field, detail } => {
                write!(f, "Malformed schema at field '{}': {}", field, detail)
            }
            ConfigError::UnknownField(field) => {
                write!(f, "Config field '{}' is not in the schema", field)
            }
            ConfigError::InvalidValue { field, expected } => {
                write!(f, "Invalid value for field '{}': expected {}", field, expected)
            }
            ConfigError::InvalidOption { field, value } => {
                write!(f, "Invalid option '{}' for field '{}'", value, field)
            }
            ConfigError::OutOfRange { field, value, min, max } => {
                write!(
                    f,
                    "Value {} for field '{}' is outside [{}, {}]",
                    value, field, min, max
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error type for asset loading
///
/// Asset errors never abort a component: they are logged, emitted on the
/// component's `error` channel, and the component stays usable without a
/// wrapped object.
#[derive(Debug)]
pub enum AssetError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid file format, deserialization failure)
    Parse(String),
    /// Asset key could not be resolved to a source
    NotFound(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io(err) => write!(f, "Asset IO error: {}", err),
            AssetError::Parse(msg) => write!(f, "Asset parse error: {}", msg),
            AssetError::NotFound(key) => write!(f, "Asset not found: {}", key),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(err) => Some(err),
            AssetError::Parse(_) => None,
            AssetError::NotFound(_) => None,
        }
    }
}

impl From<io::Error> for AssetError {
    fn from(err: io::Error) -> Self {
        AssetError::Io(err)
    }
}

impl From<String> for AssetError {
    fn from(msg: String) -> Self {
        AssetError::Parse(msg)
    }
}

impl From<&str> for AssetError {
    fn from(msg: &str) -> Self {
        AssetError::Parse(msg.to_string())
    }
}

/// Invalid lifecycle transition
///
/// The attach side effect is not internally idempotent, so the state
/// machine rejects transitions the contract forbids instead of letting
/// components double-attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The entity key does not resolve to a live entity
    UnknownEntity,
    /// No component of that type on the entity
    UnknownComponent(String),
    /// The entity already carries a component of that type
    DuplicateComponent(String),
    /// Enable called on an already-enabled component
    AlreadyEnabled(String),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::UnknownEntity => write!(f, "Entity does not exist"),
            LifecycleError::UnknownComponent(name) => {
                write!(f, "No component '{}' on entity", name)
            }
            LifecycleError::DuplicateComponent(name) => {
                write!(f, "Entity already has a component '{}'", name)
            }
            LifecycleError::AlreadyEnabled(name) => {
                write!(f, "Component '{}' is already enabled", name)
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Umbrella error for stage operations that can fail either way
#[derive(Debug)]
pub enum StageError {
    /// Schema or config problem
    Config(ConfigError),
    /// State machine problem
    Lifecycle(LifecycleError),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Config(err) => write!(f, "{}", err),
            StageError::Lifecycle(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StageError::Config(err) => Some(err),
            StageError::Lifecycle(err) => Some(err),
        }
    }
}

impl From<ConfigError> for StageError {
    fn from(err: ConfigError) -> Self {
        StageError::Config(err)
    }
}

impl From<LifecycleError> for StageError {
    fn from(err: LifecycleError) -> Self {
        StageError::Lifecycle(err)
    }
}
