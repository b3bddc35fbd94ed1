use std::fmt;

use crate::error::AccessError;
use crate::types::{GrantId, ObjectId, TypeTag, PERMISSION_DELIMITER};

// --- Entity references ------------------------------------------------------

/// Polymorphic `(type tag, id)` key for any holder or target entity.
///
/// An `EntityRef` never owns the entity it points at; resolving it back into a
/// live object is the job of an [`EntityLoader`](crate::directory::EntityLoader).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct EntityRef {
    pub type_tag: TypeTag,
    pub id: ObjectId,
}

impl EntityRef {
    pub fn new(type_tag: impl Into<TypeTag>, id: ObjectId) -> Self {
        EntityRef { type_tag: type_tag.into(), id }
    }

    /// Whether this reference points into the given model.
    #[inline]
    pub fn is_model(&self, type_tag: &str) -> bool {
        self.type_tag == type_tag
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_tag, self.id)
    }
}

// --- Permissions ------------------------------------------------------------

/// A catalog permission, unique by `(namespace, codename)`.
///
/// The kernel only accepts permissions whose canonical `"namespace.codename"`
/// string splits back into the same pair, so among accepted permissions a set
/// of `Permission`s deduplicates exactly like a set of their names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Permission {
    pub namespace: String,
    pub codename: String,
}

impl Permission {
    pub fn new(namespace: impl Into<String>, codename: impl Into<String>) -> Self {
        Permission { namespace: namespace.into(), codename: codename.into() }
    }

    /// Canonical `"namespace.codename"` form.
    pub fn name(&self) -> String {
        format!("{}{}{}", self.namespace, PERMISSION_DELIMITER, self.codename)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, PERMISSION_DELIMITER, self.codename)
    }
}

/// A syntactically valid, not yet resolved, permission name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionName<'a> {
    pub namespace: &'a str,
    pub codename: &'a str,
}

impl<'a> PermissionName<'a> {
    /// Splits `"namespace.codename"` on the first delimiter.
    ///
    /// Both halves must be non-empty and the codename must not itself contain
    /// the delimiter.
    pub fn parse(raw: &'a str) -> Result<Self, AccessError> {
        let (namespace, codename) = raw.split_once(PERMISSION_DELIMITER).ok_or_else(|| {
            AccessError::InvalidInput(format!(
                "permission name '{raw}' is missing the '{PERMISSION_DELIMITER}' delimiter"
            ))
        })?;
        if namespace.is_empty() || codename.is_empty() {
            return Err(AccessError::InvalidInput(format!(
                "permission name '{raw}' has an empty namespace or codename"
            )));
        }
        if codename.contains(PERMISSION_DELIMITER) {
            return Err(AccessError::InvalidInput(format!(
                "permission codename in '{raw}' must not contain '{PERMISSION_DELIMITER}'"
            )));
        }
        Ok(PermissionName { namespace, codename })
    }
}

/// Permission argument accepted by the kernel: either a name still to be
/// resolved, or a permission the caller already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionSpec<'a> {
    Name(&'a str),
    Resolved(Permission),
}

impl<'a> From<&'a str> for PermissionSpec<'a> {
    fn from(name: &'a str) -> Self {
        PermissionSpec::Name(name)
    }
}

impl<'a> From<&'a String> for PermissionSpec<'a> {
    fn from(name: &'a String) -> Self {
        PermissionSpec::Name(name.as_str())
    }
}

impl From<Permission> for PermissionSpec<'_> {
    fn from(permission: Permission) -> Self {
        PermissionSpec::Resolved(permission)
    }
}

impl From<&Permission> for PermissionSpec<'_> {
    fn from(permission: &Permission) -> Self {
        PermissionSpec::Resolved(permission.clone())
    }
}

// --- Grants -----------------------------------------------------------------

/// One persisted `(holder, target, permission)` authorization record.
///
/// `target == None` is a blanket grant, not tied to any object. Grants are
/// never updated: they are created by an assign and destroyed by a remove.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Grant {
    pub id: GrantId,
    pub holder: EntityRef,
    pub target: Option<EntityRef>,
    pub permission: Permission,
}

impl Grant {
    #[inline]
    pub fn is_blanket(&self) -> bool {
        self.target.is_none()
    }
}

/// Which targets a scan or a check is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetScope {
    /// Every grant regardless of target.
    #[default]
    Any,
    /// Only blanket (target-less) grants.
    Blanket,
    /// Only grants on exactly this object.
    Object(EntityRef),
}

impl TargetScope {
    /// Scope used by a check against an optional target.
    pub fn for_target(target: Option<&EntityRef>) -> Self {
        match target {
            Some(t) => TargetScope::Object(t.clone()),
            None => TargetScope::Blanket,
        }
    }

    pub fn matches(&self, target: Option<&EntityRef>) -> bool {
        match self {
            TargetScope::Any => true,
            TargetScope::Blanket => target.is_none(),
            TargetScope::Object(expected) => target == Some(expected),
        }
    }
}

// --- Principals -------------------------------------------------------------

/// The acting holder as seen by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    entity: Option<EntityRef>,
    active: bool,
}

impl Principal {
    /// An authenticated, active holder.
    pub fn new(entity: EntityRef) -> Self {
        Principal { entity: Some(entity), active: true }
    }

    /// The unauthenticated caller. Holds nothing and can be granted nothing.
    pub fn anonymous() -> Self {
        Principal { entity: None, active: false }
    }

    /// Marks the holder as deactivated by the host.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn entity(&self) -> Option<&EntityRef> {
        self.entity.as_ref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.entity.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl From<EntityRef> for Principal {
    fn from(entity: EntityRef) -> Self {
        Principal::new(entity)
    }
}
