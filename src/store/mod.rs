//! Grant storage: the durable `(holder, target, permission)` table.
//!
//! The kernel talks to storage only through [`GrantStore`]. Two backends ship
//! with the crate: [`MemoryGrantStore`] and the file-backed
//! [`JsonFileGrantStore`]; hosts with a relational database implement the
//! trait over their own table.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::primitives::{EntityRef, Grant, Permission, TargetScope};
use crate::types::{GrantId, TypeTag};

pub mod json;
pub mod memory;

pub use json::JsonFileGrantStore;
pub use memory::MemoryGrantStore;

/// Lazily evaluated scan result. Order is unspecified.
pub type GrantScan<'a> = Box<dyn Iterator<Item = Grant> + Send + 'a>;

/// Conjunction of optional predicates over grant rows. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantFilter {
    pub holder: Option<EntityRef>,
    pub holders_in: Option<BTreeSet<EntityRef>>,
    pub target: TargetScope,
    pub target_model: Option<TypeTag>,
    pub permission: Option<Permission>,
}

impl GrantFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(mut self, holder: &EntityRef) -> Self {
        self.holder = Some(holder.clone());
        self
    }

    /// Restricts to holders in `holders`. An empty set matches nothing.
    pub fn holders_in(mut self, holders: BTreeSet<EntityRef>) -> Self {
        self.holders_in = Some(holders);
        self
    }

    pub fn target(mut self, scope: TargetScope) -> Self {
        self.target = scope;
        self
    }

    /// Restricts to grants whose target belongs to `model`; excludes blanket grants.
    pub fn target_model(mut self, model: &str) -> Self {
        self.target_model = Some(model.to_owned());
        self
    }

    pub fn permission(mut self, permission: &Permission) -> Self {
        self.permission = Some(permission.clone());
        self
    }

    pub fn matches(&self, grant: &Grant) -> bool {
        if let Some(holder) = &self.holder {
            if &grant.holder != holder {
                return false;
            }
        }
        if let Some(holders) = &self.holders_in {
            if !holders.contains(&grant.holder) {
                return false;
            }
        }
        if !self.target.matches(grant.target.as_ref()) {
            return false;
        }
        if let Some(model) = &self.target_model {
            match &grant.target {
                Some(target) if target.is_model(model) => {}
                _ => return false,
            }
        }
        if let Some(permission) = &self.permission {
            if &grant.permission != permission {
                return false;
            }
        }
        true
    }
}

/// Storage contract for grants.
///
/// Each `insert` and `delete*` call must be atomic. `scan` should read one
/// consistent snapshot so a union built from a single scan never sees a grant
/// appear or vanish halfway through.
pub trait GrantStore: Send + Sync {
    /// Inserts a new row. Never checks for an identical existing row.
    fn insert(&self, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Result<GrantId>;

    /// Deletes every row matching all three fields exactly and returns how many
    /// went. `target == None` matches blanket grants only.
    fn delete(&self, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Result<usize>;

    /// Deletes every row held by `holder`, whatever the target or permission.
    fn delete_all_for_holder(&self, holder: &EntityRef) -> Result<usize>;

    fn scan(&self, filter: &GrantFilter) -> Result<GrantScan<'_>>;

    fn count(&self, filter: &GrantFilter) -> Result<usize> {
        Ok(self.scan(filter)?.count())
    }
}

impl<T: GrantStore + ?Sized> GrantStore for Arc<T> {
    fn insert(&self, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Result<GrantId> {
        (**self).insert(holder, target, permission)
    }

    fn delete(&self, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Result<usize> {
        (**self).delete(holder, target, permission)
    }

    fn delete_all_for_holder(&self, holder: &EntityRef) -> Result<usize> {
        (**self).delete_all_for_holder(holder)
    }

    fn scan(&self, filter: &GrantFilter) -> Result<GrantScan<'_>> {
        (**self).scan(filter)
    }

    fn count(&self, filter: &GrantFilter) -> Result<usize> {
        (**self).count(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::new_grant_id;

    fn grant(holder: EntityRef, target: Option<EntityRef>, codename: &str) -> Grant {
        Grant {
            id: new_grant_id(),
            holder,
            target,
            permission: Permission::new("tests", codename),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let g = grant(EntityRef::new("auth.user", 1), None, "can_eat");
        assert!(GrantFilter::new().matches(&g));
    }

    #[test]
    fn test_filter_is_a_conjunction() {
        let user = EntityRef::new("auth.user", 1);
        let apple = EntityRef::new("tests.apple", 1);
        let g = grant(user.clone(), Some(apple.clone()), "can_eat");

        let filter = GrantFilter::new()
            .holder(&user)
            .target(TargetScope::Object(apple.clone()))
            .target_model("tests.apple")
            .permission(&Permission::new("tests", "can_eat"));
        assert!(filter.matches(&g));

        assert!(!filter.clone().permission(&Permission::new("tests", "can_be_awesome")).matches(&g));
        assert!(!filter.clone().target_model("tests.orange").matches(&g));
        assert!(!filter.holder(&EntityRef::new("auth.user", 2)).matches(&g));
    }

    #[test]
    fn test_holders_in_set() {
        let g = grant(EntityRef::new("auth.group", 4), None, "can_eat");
        let set: BTreeSet<_> = [EntityRef::new("auth.user", 1), EntityRef::new("auth.group", 4)].into();
        assert!(GrantFilter::new().holders_in(set).matches(&g));
        assert!(!GrantFilter::new().holders_in(BTreeSet::new()).matches(&g));
    }

    #[test]
    fn test_target_model_excludes_blanket_grants() {
        let g = grant(EntityRef::new("auth.user", 1), None, "can_eat");
        assert!(!GrantFilter::new().target_model("tests.apple").matches(&g));
        assert!(GrantFilter::new().target(TargetScope::Blanket).matches(&g));
    }
}
