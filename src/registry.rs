//!
//! Indirection paths: the intermediary models through which a holder's
//! authorization is expanded (for example "the groups this user belongs to").
//!
//! The registry is built once at startup from [`Settings`] and is read-only
//! afterwards. Misconfiguration fails construction instead of being skipped.

use std::collections::BTreeSet;

use crate::config::Settings;
use crate::directory::{MembershipSource, TypeRegistry};
use crate::error::{AccessError, Result};
use crate::primitives::EntityRef;
use crate::types::TypeTag;

/// One configured intermediary model and the attribute that lists its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectionPath {
    pub model_tag: TypeTag,
    pub attribute: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndirectionRegistry {
    paths: Vec<IndirectionPath>,
}

impl IndirectionRegistry {
    /// A registry with no paths: only direct grants count.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the registry, validating each entry against `types`.
    ///
    /// # Errors
    /// `AccessError::Config` on an unknown model, an empty attribute, or a model
    /// configured twice.
    pub fn from_settings(settings: &Settings, types: &dyn TypeRegistry) -> Result<Self> {
        let mut paths: Vec<IndirectionPath> = Vec::with_capacity(settings.indirection.len());
        for entry in &settings.indirection {
            if !types.is_model(&entry.model) {
                return Err(AccessError::Config(format!(
                    "indirection model '{}' is not a registered model",
                    entry.model
                )));
            }
            if entry.attribute.trim().is_empty() {
                return Err(AccessError::Config(format!(
                    "indirection model '{}' has an empty membership attribute",
                    entry.model
                )));
            }
            if paths.iter().any(|p| p.model_tag == entry.model) {
                return Err(AccessError::Config(format!(
                    "indirection model '{}' is configured more than once",
                    entry.model
                )));
            }
            paths.push(IndirectionPath {
                model_tag: entry.model.clone(),
                attribute: entry.attribute.clone(),
            });
        }
        tracing::debug!(paths = paths.len(), "indirection registry loaded");
        Ok(IndirectionRegistry { paths })
    }

    pub fn paths(&self) -> &[IndirectionPath] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Every intermediary standing behind `principal`, across all paths.
    /// One level only: intermediaries of intermediaries are not expanded.
    pub fn intermediaries_of(
        &self,
        membership: &dyn MembershipSource,
        principal: &EntityRef,
    ) -> Result<BTreeSet<EntityRef>> {
        let mut found = BTreeSet::new();
        for path in &self.paths {
            found.extend(membership.intermediaries(&path.model_tag, &path.attribute, principal)?);
        }
        // A source may be loose about models; keep only what the paths asked for.
        found.retain(|m: &EntityRef| self.paths.iter().any(|p| m.is_model(&p.model_tag)));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{MembershipTable, StaticTypeRegistry};

    fn types() -> StaticTypeRegistry {
        StaticTypeRegistry::new().model("auth.group").model("org.team").model("auth.user")
    }

    #[test]
    fn test_from_settings_builds_paths_in_order() {
        let settings = Settings::default()
            .with_indirection("auth.group", "user")
            .with_indirection("org.team", "members");
        let registry = IndirectionRegistry::from_settings(&settings, &types()).unwrap();

        let tags: Vec<_> = registry.paths().iter().map(|p| p.model_tag.as_str()).collect();
        assert_eq!(tags, ["auth.group", "org.team"]);
    }

    #[test]
    fn test_unknown_model_fails_loudly() {
        let settings = Settings::default().with_indirection("auth.grop", "user");
        let err = IndirectionRegistry::from_settings(&settings, &types()).unwrap_err();
        assert!(matches!(err, AccessError::Config(ref msg) if msg.contains("auth.grop")));
    }

    #[test]
    fn test_empty_attribute_and_duplicates_fail() {
        let blank = Settings::default().with_indirection("auth.group", " ");
        assert!(IndirectionRegistry::from_settings(&blank, &types()).is_err());

        let twice = Settings::default()
            .with_indirection("auth.group", "user")
            .with_indirection("auth.group", "admin");
        assert!(IndirectionRegistry::from_settings(&twice, &types()).is_err());
    }

    #[test]
    fn test_intermediaries_union_across_paths() {
        let settings = Settings::default()
            .with_indirection("auth.group", "user")
            .with_indirection("org.team", "members");
        let registry = IndirectionRegistry::from_settings(&settings, &types()).unwrap();

        let alice = EntityRef::new("auth.user", 1);
        let table = MembershipTable::new();
        table.add_member(&EntityRef::new("auth.group", 1), "user", &alice);
        table.add_member(&EntityRef::new("org.team", 9), "members", &alice);
        // Wrong attribute for the configured path.
        table.add_member(&EntityRef::new("auth.group", 2), "members", &alice);

        let found = registry.intermediaries_of(&table, &alice).unwrap();
        let expected: BTreeSet<_> = [EntityRef::new("auth.group", 1), EntityRef::new("org.team", 9)].into();
        assert_eq!(found, expected);

    }

    #[test]
    fn test_empty_registry_yields_no_intermediaries() {
        let table = MembershipTable::new();
        table.add_member(&EntityRef::new("auth.group", 1), "user", &EntityRef::new("auth.user", 1));
        let found = IndirectionRegistry::empty()
            .intermediaries_of(&table, &EntityRef::new("auth.user", 1))
            .unwrap();
        assert!(found.is_empty());
    }
}
