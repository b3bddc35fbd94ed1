#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! olp-core is an object-level permission engine.
//!
//! Permissions are granted to holders either on a specific object or as a
//! blanket grant with no object. A holder's effective permissions include the
//! grants of the intermediaries it belongs to (for example its groups), and
//! reverse queries list every object a holder may act on.

// Shared scalar types (type tags, object ids, grant ids).
pub mod types;

// Entity references, permissions, grants and principals.
pub mod primitives;

pub use primitives::*;

pub mod error;

pub mod config;

// Permission catalog, name resolution and its cache.
pub mod catalog;
pub mod resolver;

// Host-side collaborators: model registry, membership, entity loading.
pub mod directory;

pub mod registry;

pub mod store;

pub mod kernel;

pub mod access;

#[cfg(feature = "subscriber")]
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use access::HolderAccess;
pub use error::{AccessError, Result};
pub use kernel::{AccessPlan, BackendChain, Kernel, PermissionBackend};
