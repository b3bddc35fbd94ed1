//!
//! Resolution engine: grant assignment and the yes/no and enumerate-all
//! permission questions for a holder.
//!
//! A holder's effective permissions are its direct grants plus the grants of
//! every intermediary reachable through the indirection registry (one level).
//! Both halves are answered by the grant store; the kernel only assembles the
//! set of principals to ask about.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::PermissionCatalog;
use crate::config::Settings;
use crate::directory::{MembershipSource, TypeRegistry};
use crate::error::{AccessError, Result};
use crate::primitives::{EntityRef, Permission, PermissionSpec, Principal, TargetScope};
use crate::registry::IndirectionRegistry;
use crate::resolver::{PermissionCache, PermissionResolver};
use crate::store::{GrantFilter, GrantStore};
use crate::types::GrantId;

/// The permission kernel. Holds no mutable state of its own apart from the
/// resolver's cache; everything else lives in the grant store.
pub struct Kernel<S: GrantStore, C: PermissionCatalog> {
    pub(crate) store: S,
    pub(crate) resolver: PermissionResolver<C>,
    pub(crate) registry: IndirectionRegistry,
    pub(crate) types: Arc<dyn TypeRegistry>,
    pub(crate) membership: Arc<dyn MembershipSource>,
}

impl<S, C> Kernel<S, C>
where
    S: GrantStore,
    C: PermissionCatalog,
{
    pub fn new(
        store: S,
        resolver: PermissionResolver<C>,
        registry: IndirectionRegistry,
        types: Arc<dyn TypeRegistry>,
        membership: Arc<dyn MembershipSource>,
    ) -> Self {
        Kernel { store, resolver, registry, types, membership }
    }

    /// Builds a kernel from startup settings. Fails if the indirection
    /// configuration names models the type registry does not know.
    pub fn from_settings(
        settings: &Settings,
        store: S,
        catalog: C,
        types: Arc<dyn TypeRegistry>,
        membership: Arc<dyn MembershipSource>,
    ) -> Result<Self> {
        let registry = IndirectionRegistry::from_settings(settings, types.as_ref())?;
        let resolver = PermissionResolver::new(catalog, PermissionCache::new(settings.cache.policy));
        Ok(Self::new(store, resolver, registry, types, membership))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &PermissionResolver<C> {
        &self.resolver
    }

    pub fn registry(&self) -> &IndirectionRegistry {
        &self.registry
    }

    // --- Mutations ----------------------------------------------------------

    /// Grants `permission` to `holder`, on `target` or as a blanket grant.
    ///
    /// Returns `Ok(false)` without touching storage when the permission does
    /// not resolve. Not idempotent: assigning twice stores two rows.
    pub fn assign<'a>(
        &self,
        holder: &EntityRef,
        permission: impl Into<PermissionSpec<'a>>,
        target: Option<&EntityRef>,
    ) -> Result<bool> {
        Ok(self.assign_returning_id(holder, permission, target)?.is_some())
    }

    /// Like [`assign`](Self::assign), returning the new grant's id.
    pub fn assign_returning_id<'a>(
        &self,
        holder: &EntityRef,
        permission: impl Into<PermissionSpec<'a>>,
        target: Option<&EntityRef>,
    ) -> Result<Option<GrantId>> {
        let spec = permission.into();
        let Some(permission) = self.resolver.try_resolve(spec.clone())? else {
            tracing::warn!(holder = %holder, permission = ?spec, "assign skipped: unknown permission");
            return Ok(None);
        };
        let id = self.store.insert(holder, target, &permission)?;
        tracing::debug!(holder = %holder, permission = %permission, target = ?target, grant = %id, "permission assigned");
        Ok(Some(id))
    }

    /// Deletes every grant of `permission` to `holder` on `target`.
    ///
    /// Succeeds even when there was nothing to delete; `Ok(false)` only means
    /// the permission itself does not resolve.
    pub fn remove<'a>(
        &self,
        holder: &EntityRef,
        permission: impl Into<PermissionSpec<'a>>,
        target: Option<&EntityRef>,
    ) -> Result<bool> {
        let Some(permission) = self.resolver.try_resolve(permission.into())? else {
            return Ok(false);
        };
        let removed = self.store.delete(holder, target, &permission)?;
        tracing::debug!(holder = %holder, permission = %permission, target = ?target, removed, "permission removed");
        Ok(true)
    }

    /// De-provisions `holder`: drops every grant it holds. Other holders'
    /// identical grants are untouched.
    pub fn remove_all_permissions(&self, holder: &EntityRef) -> Result<usize> {
        let removed = self.store.delete_all_for_holder(holder)?;
        tracing::debug!(holder = %holder, removed, "all permissions removed");
        Ok(removed)
    }

    // --- Resolution ---------------------------------------------------------

    /// Permissions granted to `holder` itself on `target` (blanket grants when `None`).
    pub fn direct_permissions(&self, holder: &EntityRef, target: Option<&EntityRef>) -> Result<BTreeSet<Permission>> {
        let filter = GrantFilter::new().holder(holder).target(TargetScope::for_target(target));
        Ok(self.store.scan(&filter)?.map(|g| g.permission).collect())
    }

    /// Permissions reaching the principal through its intermediaries.
    ///
    /// All intermediaries across all paths are folded into a single
    /// `holder ∈ {…}` scan, so the result comes from one storage snapshot.
    pub fn group_permissions_for(
        &self,
        principal: &Principal,
        target: Option<&EntityRef>,
    ) -> Result<BTreeSet<Permission>> {
        let Some(holder) = principal.entity() else {
            return Ok(BTreeSet::new());
        };
        let intermediaries = self.registry.intermediaries_of(self.membership.as_ref(), holder)?;
        if intermediaries.is_empty() {
            return Ok(BTreeSet::new());
        }
        tracing::debug!(holder = %holder, intermediaries = intermediaries.len(), "expanding indirect holders");

        let filter = GrantFilter::new()
            .holders_in(intermediaries)
            .target(TargetScope::for_target(target));
        Ok(self.store.scan(&filter)?.map(|g| g.permission).collect())
    }

    /// Every permission the principal holds on `target`, direct or indirect.
    /// Anonymous principals hold nothing and never reach storage.
    ///
    /// The holder and its intermediaries go into one `holder ∈ {…}` scan, so
    /// direct and indirect grants are read from the same snapshot.
    pub fn all_permissions_for(
        &self,
        principal: &Principal,
        target: Option<&EntityRef>,
    ) -> Result<BTreeSet<Permission>> {
        let Some(holder) = principal.entity() else {
            return Ok(BTreeSet::new());
        };
        let mut holders = self.registry.intermediaries_of(self.membership.as_ref(), holder)?;
        holders.insert(holder.clone());

        let filter = GrantFilter::new()
            .holders_in(holders)
            .target(TargetScope::for_target(target));
        Ok(self.store.scan(&filter)?.map(|g| g.permission).collect())
    }

    /// Whether the principal holds `permission` on `target`.
    ///
    /// Inactive and anonymous principals are denied before anything is
    /// resolved. An unknown permission is a denial; a malformed name or a
    /// storage failure is an error.
    pub fn has_perm<'a>(
        &self,
        principal: &Principal,
        permission: impl Into<PermissionSpec<'a>>,
        target: Option<&EntityRef>,
    ) -> Result<bool> {
        if !principal.is_active() {
            return Ok(false);
        }
        let Some(permission) = self.resolver.try_resolve(permission.into())? else {
            return Ok(false);
        };
        Ok(self.all_permissions_for(principal, target)?.contains(&permission))
    }

    /// The principal's entity, or `InvalidInput` for the anonymous principal.
    pub(crate) fn require_holder<'p>(&self, principal: &'p Principal) -> Result<&'p EntityRef> {
        principal
            .entity()
            .ok_or_else(|| AccessError::InvalidInput("anonymous principal cannot hold grants".into()))
    }
}

impl<S, C> std::fmt::Debug for Kernel<S, C>
where
    S: GrantStore + std::fmt::Debug,
    C: PermissionCatalog + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("store", &self.store)
            .field("resolver", &self.resolver)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
