//!
//! Read-only view of the host's permission catalog.
//!
//! The catalog owns permission definitions (names, descriptions, which model
//! they were declared on). The kernel only ever asks it which permissions carry
//! a given codename.

use std::sync::Arc;

use crate::error::Result;
use crate::primitives::Permission;

/// Lookup interface over the external permission catalog.
pub trait PermissionCatalog: Send + Sync {
    /// Every catalog permission whose codename equals `codename`, in any namespace.
    fn find_by_codename(&self, codename: &str) -> Result<Vec<Permission>>;
}

impl<T: PermissionCatalog + ?Sized> PermissionCatalog for Arc<T> {
    fn find_by_codename(&self, codename: &str) -> Result<Vec<Permission>> {
        (**self).find_by_codename(codename)
    }
}

/// Catalog backed by a fixed list, for hosts whose permissions are known at build time.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    permissions: Vec<Permission>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a permission; adding the same pair twice keeps a single entry.
    pub fn with(mut self, namespace: &str, codename: &str) -> Self {
        self.insert(Permission::new(namespace, codename));
        self
    }

    pub fn insert(&mut self, permission: Permission) {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

impl PermissionCatalog for MemoryCatalog {
    fn find_by_codename(&self, codename: &str) -> Result<Vec<Permission>> {
        Ok(self
            .permissions
            .iter()
            .filter(|p| p.codename == codename)
            .cloned()
            .collect())
    }
}
