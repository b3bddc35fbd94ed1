//! Shared scalar types used across the crate.
//!
//! The structured records built from these (`EntityRef`, `Permission`,
//! `Grant`, ...) live in `primitives.rs`.

/// Model tag identifying an entity type, e.g. `"tests.apple"` or `"auth.group"`.
///
/// Tags are assigned by the host's identity/type registry; this crate only
/// compares them for equality.
pub type TypeTag = String;

/// Numeric primary key of an entity inside its model.
pub type ObjectId = u64;

/// Identifier of a persisted grant row.
pub type GrantId = uuid::Uuid;

/// Separator between the namespace and the codename of a permission name.
pub const PERMISSION_DELIMITER: char = '.';

/// Generates a fresh grant identifier.
#[inline]
pub fn new_grant_id() -> GrantId {
    uuid::Uuid::new_v4()
}
