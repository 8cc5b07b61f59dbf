//! Core entity-component layer for stagecraft
//!
//! This crate provides the machinery every component type builds on:
//!
//! - [`Schema`] - Declarative field descriptions with defaults, bounds,
//!   conditional visibility, and enum option tables
//! - [`Component`] - The lifecycle trait (init, enable, disable, load, error)
//! - [`ComponentRegistry`] - Type name to schema and factory
//! - [`Entity`] / [`EntityKey`] - Component containers with generational keys
//! - [`Stage`] - Owner of entities, the registry, and the asset pump
//! - [`AssetCache`] / [`AssetSource`] - Keyed, deduplicating asset store
//!   fed by an injected loader
//! - [`EventChannel`] - Typed per-slot lifecycle event channels
//!
//! The layer is single-threaded: all lifecycle transitions and asset
//! deliveries happen on the thread that owns the [`Stage`].

mod assets;
mod component;
mod entity;
mod error;
mod events;
mod registry;
mod schema;
mod stage;
mod value;

pub use assets::{
    downcast_object, AssetCache, AssetSlot, AssetSource, Requester, SharedObject,
};
pub use component::{Component, ComponentCtx, ComponentSlot, LifecycleState};
pub use entity::{Entity, EntityKey};
pub use error::{AssetError, ConfigError, LifecycleError, StageError};
pub use events::{
    ComponentEvents, ErrorEvent, EventChannel, LoadedEvent, ProgressEvent, SubscriberId,
};
pub use registry::ComponentRegistry;
pub use schema::{
    EnumSelect, FieldKind, FieldSpec, LiteralType, PendingAsset, ResolvedParams, Schema,
    VisibleWhen,
};
pub use stage::Stage;
pub use value::{ConfigMap, ParamValue, Value};
