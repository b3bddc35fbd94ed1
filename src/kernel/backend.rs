//! Authorization backend abstraction.
//!
//! Host frameworks typically consult a list of backends and grant access if
//! any of them does. `PermissionBackend` is that seam; the kernel implements
//! it, and [`BackendChain`] folds several backends together.

use std::collections::BTreeSet;

use super::core::Kernel;
use crate::catalog::PermissionCatalog;
use crate::error::Result;
use crate::primitives::{EntityRef, Permission, Principal};
use crate::store::GrantStore;

/// Trait implemented by pluggable authorization backends.
pub trait PermissionBackend: Send + Sync {
    fn all_permissions(&self, principal: &Principal, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>>;

    fn group_permissions(&self, principal: &Principal, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>>;

    fn has_perm(&self, principal: &Principal, permission: &str, target: Option<&EntityRef>) -> Result<bool>;
}

impl<S, C> PermissionBackend for Kernel<S, C>
where
    S: GrantStore,
    C: PermissionCatalog,
{
    fn all_permissions(&self, principal: &Principal, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>> {
        self.all_permissions_for(principal, target)
    }

    fn group_permissions(&self, principal: &Principal, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>> {
        self.group_permissions_for(principal, target)
    }

    fn has_perm(&self, principal: &Principal, permission: &str, target: Option<&EntityRef>) -> Result<bool> {
        Kernel::has_perm(self, principal, permission, target)
    }
}

/// Ordered list of backends. A permission is held if any backend grants it.
#[derive(Default)]
pub struct BackendChain {
    backends: Vec<Box<dyn PermissionBackend>>,
}

impl BackendChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, backend: impl PermissionBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl PermissionBackend for BackendChain {
    fn all_permissions(&self, principal: &Principal, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>> {
        let mut all = BTreeSet::new();
        for backend in &self.backends {
            all.extend(backend.all_permissions(principal, target)?);
        }
        Ok(all)
    }

    fn group_permissions(&self, principal: &Principal, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>> {
        let mut all = BTreeSet::new();
        for backend in &self.backends {
            all.extend(backend.group_permissions(principal, target)?);
        }
        Ok(all)
    }

    // Stops at the first grant; an error from an earlier backend is not masked
    // by a later one.
    fn has_perm(&self, principal: &Principal, permission: &str, target: Option<&EntityRef>) -> Result<bool> {
        for backend in &self.backends {
            if backend.has_perm(principal, permission, target)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
