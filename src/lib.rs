//! Stagecraft: a component layer for 3D scene editors and runtimes
//!
//! The workspace splits into three crates:
//!
//! - [`stagecraft_core`] - registry, schemas, lifecycle, asset cache,
//!   event channels, the [`Stage`] runtime
//! - [`stagecraft_components`] - the built-in material, geometry, sprite,
//!   and joint components
//! - this crate - application configuration, scene documents, and the
//!   file-backed asset source
//!
//! A typical session: load an [`AppConfig`], build a registry with
//! [`register_builtin`], create a [`Stage`], instantiate a [`SceneDoc`],
//! then drive [`Stage::pump_assets`] with a [`FileAssetSource`].

pub mod config;
pub mod scene;
pub mod source;

pub use config::AppConfig;
pub use scene::{ComponentDoc, EntityDoc, SceneDoc, SceneError};
pub use source::FileAssetSource;

pub use stagecraft_components::register_builtin;
pub use stagecraft_core::{
    downcast_object, AssetCache, AssetError, AssetSource, Component, ComponentCtx,
    ComponentRegistry, ConfigError, ConfigMap, Entity, EntityKey, FieldSpec, LifecycleError,
    LiteralType, ParamValue, ResolvedParams, Schema, SharedObject, Stage, StageError, Value,
};
