//!
//! Reverse queries: which objects may a principal act on with a permission.
//!
//! A query is first planned (permission resolved, target model settled,
//! principal expanded into every holder standing behind it) and then run as a
//! single scan over the grant store.

use std::collections::BTreeSet;

use super::core::Kernel;
use crate::catalog::PermissionCatalog;
use crate::directory::EntityLoader;
use crate::error::Result;
use crate::primitives::{EntityRef, Permission, PermissionSpec, Principal};
use crate::store::{GrantFilter, GrantStore};
use crate::types::TypeTag;

/// A fully resolved reverse query, ready to run against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPlan {
    pub permission: Permission,
    pub target_model: TypeTag,
    /// The principal itself plus every intermediary behind it.
    pub holders: BTreeSet<EntityRef>,
}

impl AccessPlan {
    pub fn filter(&self) -> GrantFilter {
        GrantFilter::new()
            .holders_in(self.holders.clone())
            .target_model(&self.target_model)
            .permission(&self.permission)
    }
}

impl<S, C> Kernel<S, C>
where
    S: GrantStore,
    C: PermissionCatalog,
{
    /// Plans a reverse query, or returns `None` when the answer is known to be
    /// empty: anonymous or inactive principal, unknown permission, or no
    /// determinable target model.
    pub fn plan_access<'a>(
        &self,
        principal: &Principal,
        permission: impl Into<PermissionSpec<'a>>,
        target_model: Option<&str>,
    ) -> Result<Option<AccessPlan>> {
        let Some(holder) = principal.entity() else {
            return Ok(None);
        };
        if !principal.is_active() {
            return Ok(None);
        }
        let Some(permission) = self.resolver.try_resolve(permission.into())? else {
            return Ok(None);
        };

        let target_model = match target_model {
            Some(model) if self.types.is_model(model) => model.to_owned(),
            Some(model) => {
                tracing::warn!(model, permission = %permission, "reverse query on unknown model");
                return Ok(None);
            }
            None => match self.types.default_model_for(&permission.namespace) {
                Some(model) => model,
                None => {
                    tracing::warn!(permission = %permission, "no default model for permission namespace");
                    return Ok(None);
                }
            },
        };

        let mut holders = self.registry.intermediaries_of(self.membership.as_ref(), holder)?;
        holders.insert(holder.clone());

        Ok(Some(AccessPlan { permission, target_model, holders }))
    }

    /// Every object of `target_model` (or of the permission's default model)
    /// on which the principal holds `permission`, directly or through any
    /// indirection path. Blanket grants name no object and never appear here.
    pub fn objects_accessible_to<'a>(
        &self,
        principal: &Principal,
        permission: impl Into<PermissionSpec<'a>>,
        target_model: Option<&str>,
    ) -> Result<BTreeSet<EntityRef>> {
        let Some(plan) = self.plan_access(principal, permission, target_model)? else {
            return Ok(BTreeSet::new());
        };
        let targets: BTreeSet<EntityRef> = self
            .store
            .scan(&plan.filter())?
            .filter_map(|g| g.target)
            .collect();
        tracing::debug!(
            permission = %plan.permission,
            model = %plan.target_model,
            holders = plan.holders.len(),
            targets = targets.len(),
            "reverse query"
        );
        Ok(targets)
    }

    /// [`objects_accessible_to`](Self::objects_accessible_to), handing the
    /// references to `loader` to fetch the full entities.
    pub fn load_accessible_objects<'a, L: EntityLoader>(
        &self,
        loader: &L,
        principal: &Principal,
        permission: impl Into<PermissionSpec<'a>>,
        target_model: Option<&str>,
    ) -> Result<Vec<L::Entity>> {
        let Some(plan) = self.plan_access(principal, permission, target_model)? else {
            return Ok(Vec::new());
        };
        let targets: BTreeSet<EntityRef> = self
            .store
            .scan(&plan.filter())?
            .filter_map(|g| g.target)
            .collect();
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        loader.load(&plan.target_model, &targets)
    }
}
