use std::collections::BTreeSet;

use crate::catalog::PermissionCatalog;
use crate::error::Result;
use crate::kernel::Kernel;
use crate::primitives::{EntityRef, Permission, PermissionSpec, Principal};
use crate::store::GrantStore;

/// One principal's view of the kernel.
#[derive(Debug)]
pub struct HolderAccess<'k, S: GrantStore, C: PermissionCatalog> {
    kernel: &'k Kernel<S, C>,
    principal: Principal,
}

impl<S, C> Kernel<S, C>
where
    S: GrantStore,
    C: PermissionCatalog,
{
    pub fn for_holder(&self, principal: impl Into<Principal>) -> HolderAccess<'_, S, C> {
        HolderAccess { kernel: self, principal: principal.into() }
    }
}

impl<'k, S, C> HolderAccess<'k, S, C>
where
    S: GrantStore,
    C: PermissionCatalog,
{
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    // --- Mutations ----------------------------------------------------------

    /// # Errors
    /// `InvalidInput` when the principal is anonymous.
    pub fn assign<'a>(&self, permission: impl Into<PermissionSpec<'a>>, target: Option<&EntityRef>) -> Result<bool> {
        let holder = self.kernel.require_holder(&self.principal)?;
        self.kernel.assign(holder, permission, target)
    }

    /// # Errors
    /// `InvalidInput` when the principal is anonymous.
    pub fn remove<'a>(&self, permission: impl Into<PermissionSpec<'a>>, target: Option<&EntityRef>) -> Result<bool> {
        let holder = self.kernel.require_holder(&self.principal)?;
        self.kernel.remove(holder, permission, target)
    }

    pub fn remove_all(&self) -> Result<usize> {
        let holder = self.kernel.require_holder(&self.principal)?;
        self.kernel.remove_all_permissions(holder)
    }

    // --- Queries ------------------------------------------------------------

    pub fn has_perm<'a>(&self, permission: impl Into<PermissionSpec<'a>>, target: Option<&EntityRef>) -> Result<bool> {
        self.kernel.has_perm(&self.principal, permission, target)
    }

    pub fn all_permissions(&self, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>> {
        self.kernel.all_permissions_for(&self.principal, target)
    }

    pub fn group_permissions(&self, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>> {
        self.kernel.group_permissions_for(&self.principal, target)
    }

    pub fn objects_accessible<'a>(
        &self,
        permission: impl Into<PermissionSpec<'a>>,
        target_model: Option<&str>,
    ) -> Result<BTreeSet<EntityRef>> {
        self.kernel.objects_accessible_to(&self.principal, permission, target_model)
    }
}
