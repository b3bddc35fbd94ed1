//!
//! Permission identifier resolution: `"namespace.codename"` to [`Permission`].
//!
//! Successful resolutions are memoised in a [`PermissionCache`] owned by the
//! resolver. The catalog is treated as static for the life of the process, so
//! under [`CachePolicy::Never`] an edit to the live catalog is only observed
//! after [`PermissionCache::invalidate`] or [`PermissionCache::clear`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::catalog::PermissionCatalog;
use crate::error::{AccessError, Result};
use crate::primitives::{Permission, PermissionName, PermissionSpec};

/// Eviction policy of the resolution cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep every successful resolution until explicitly invalidated.
    #[default]
    Never,
    /// Do not cache; every resolution hits the catalog.
    Disabled,
}

/// Append-only map from the caller's original string to the resolved permission.
///
/// Safe for concurrent readers. Two threads resolving the same new name race
/// benignly: both compute the same value and the first insert wins.
#[derive(Debug, Default)]
pub struct PermissionCache {
    policy: CachePolicy,
    entries: RwLock<HashMap<String, Permission>>,
}

impl PermissionCache {
    pub fn new(policy: CachePolicy) -> Self {
        PermissionCache { policy, entries: RwLock::new(HashMap::new()) }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn get(&self, name: &str) -> Option<Permission> {
        if self.policy == CachePolicy::Disabled {
            return None;
        }
        // Entries are plain values; a poisoned lock still holds a consistent map.
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(name).cloned()
    }

    /// Stores `permission` under `name` unless another writer got there first,
    /// and returns whichever value ends up cached.
    pub fn insert(&self, name: &str, permission: Permission) -> Permission {
        if self.policy == CachePolicy::Disabled {
            return permission;
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(name.to_owned()).or_insert(permission).clone()
    }

    /// Drops one cached name. Returns whether it was present.
    pub fn invalidate(&self, name: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(name).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves permission names against a catalog, through a cache.
#[derive(Debug)]
pub struct PermissionResolver<C: PermissionCatalog> {
    catalog: C,
    cache: PermissionCache,
}

impl<C: PermissionCatalog> PermissionResolver<C> {
    pub fn new(catalog: C, cache: PermissionCache) -> Self {
        PermissionResolver { catalog, cache }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// Resolves `raw` to a catalog permission.
    ///
    /// # Errors
    /// * `InvalidInput` if `raw` is not of the form `namespace.codename`.
    /// * `NotFound` if no catalog row carries that exact pair.
    /// * `StorageUnavailable` if the catalog lookup itself failed.
    pub fn resolve(&self, raw: &str) -> Result<Permission> {
        if let Some(hit) = self.cache.get(raw) {
            tracing::debug!(permission = raw, "permission cache hit");
            return Ok(hit);
        }

        let name = PermissionName::parse(raw)?;
        let candidates = self.catalog.find_by_codename(name.codename)?;

        // Several namespaces may declare the same codename; only the requested
        // namespace counts.
        let resolved = candidates
            .into_iter()
            .find(|p| p.namespace == name.namespace)
            .ok_or_else(|| AccessError::NotFound(raw.to_owned()))?;

        tracing::debug!(permission = raw, "permission resolved from catalog");
        Ok(self.cache.insert(raw, resolved))
    }

    /// Resolves a permission argument.
    ///
    /// An already-built [`Permission`] is held to the same rule as a name: it
    /// must be a catalog row reachable through its canonical name, otherwise
    /// `NotFound`.
    pub fn resolve_spec(&self, spec: PermissionSpec<'_>) -> Result<Permission> {
        match spec {
            PermissionSpec::Name(raw) => self.resolve(raw),
            PermissionSpec::Resolved(permission) => self.verify(permission),
        }
    }

    fn verify(&self, permission: Permission) -> Result<Permission> {
        let raw = permission.name();
        if self.cache.get(&raw).as_ref() == Some(&permission) {
            return Ok(permission);
        }

        // A pair whose canonical name splits differently (a delimiter inside
        // the namespace, say) would alias another permission's name.
        let nameable = matches!(
            PermissionName::parse(&raw),
            Ok(name) if name.namespace == permission.namespace && name.codename == permission.codename
        );
        if !nameable {
            return Err(AccessError::NotFound(raw));
        }

        if !self.catalog.find_by_codename(&permission.codename)?.contains(&permission) {
            return Err(AccessError::NotFound(raw));
        }
        tracing::debug!(permission = %raw, "permission verified against catalog");
        Ok(self.cache.insert(&raw, permission))
    }

    /// Like [`resolve_spec`](Self::resolve_spec), but folds `NotFound` into `None`.
    pub fn try_resolve(&self, spec: PermissionSpec<'_>) -> Result<Option<Permission>> {
        match self.resolve_spec(spec) {
            Ok(permission) => Ok(Some(permission)),
            Err(e) if e.is_denial() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Catalog wrapper counting lookups, to observe cache behaviour.
    struct CountingCatalog {
        inner: MemoryCatalog,
        lookups: AtomicUsize,
    }

    impl PermissionCatalog for CountingCatalog {
        fn find_by_codename(&self, codename: &str) -> Result<Vec<Permission>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_codename(codename)
        }
    }

    fn counting(policy: CachePolicy) -> PermissionResolver<CountingCatalog> {
        let inner = MemoryCatalog::new()
            .with("tests", "can_be_awesome")
            .with("tests", "can_eat")
            .with("pantry", "can_eat");
        PermissionResolver::new(
            CountingCatalog { inner, lookups: AtomicUsize::new(0) },
            PermissionCache::new(policy),
        )
    }

    #[test]
    fn test_resolve_known_permission() {
        let resolver = counting(CachePolicy::Never);
        let perm = resolver.resolve("tests.can_be_awesome").unwrap();
        assert_eq!(perm, Permission::new("tests", "can_be_awesome"));
    }

    #[test]
    fn test_resolve_picks_namespace_among_shared_codenames() {
        let resolver = counting(CachePolicy::Never);
        assert_eq!(resolver.resolve("pantry.can_eat").unwrap().namespace, "pantry");
        assert_eq!(resolver.resolve("tests.can_eat").unwrap().namespace, "tests");
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        let resolver = counting(CachePolicy::Never);
        assert_eq!(
            resolver.resolve("bogus.nope"),
            Err(AccessError::NotFound("bogus.nope".into()))
        );
        // Codename exists but under another namespace.
        assert!(matches!(resolver.resolve("test.can_be_awesome"), Err(AccessError::NotFound(_))));
    }

    #[test]
    fn test_resolve_malformed_is_invalid_input() {
        let resolver = counting(CachePolicy::Never);
        assert!(matches!(resolver.resolve("can_be_awesome"), Err(AccessError::InvalidInput(_))));
        assert_eq!(resolver.catalog().lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cache_serves_repeat_resolutions() {
        let resolver = counting(CachePolicy::Never);
        resolver.resolve("tests.can_eat").unwrap();
        resolver.resolve("tests.can_eat").unwrap();
        assert_eq!(resolver.catalog().lookups.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cache().len(), 1);

        assert!(resolver.cache().invalidate("tests.can_eat"));
        resolver.resolve("tests.can_eat").unwrap();
        assert_eq!(resolver.catalog().lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_resolutions_are_not_cached() {
        let resolver = counting(CachePolicy::Never);
        let _ = resolver.resolve("bogus.nope");
        let _ = resolver.resolve("bogus.nope");
        assert!(resolver.cache().is_empty());
        assert_eq!(resolver.catalog().lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolved_permission_must_be_in_catalog() {
        let resolver = counting(CachePolicy::Never);
        let eat = Permission::new("tests", "can_eat");
        assert_eq!(resolver.resolve_spec(PermissionSpec::from(&eat)).unwrap(), eat);

        let bogus = Permission::new("bogus", "nope");
        assert_eq!(
            resolver.resolve_spec(bogus.into()),
            Err(AccessError::NotFound("bogus.nope".into()))
        );
        // Right codename, wrong namespace.
        let wrong_ns = Permission::new("test", "can_eat");
        assert!(matches!(resolver.try_resolve(wrong_ns.into()), Ok(None)));
    }

    #[test]
    fn test_resolved_permission_with_aliasing_name_is_not_found() {
        let resolver = counting(CachePolicy::Never);
        for (ns, code) in [("tests.can", "eat"), ("tests", "can.eat"), ("", "can_eat"), ("tests", "")] {
            let err = resolver.resolve_spec(Permission::new(ns, code).into()).unwrap_err();
            assert!(err.is_denial(), "{ns:?}/{code:?}");
        }
        assert_eq!(resolver.catalog().lookups.load(Ordering::SeqCst), 0);
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_resolved_permission_shares_the_name_cache() {
        let resolver = counting(CachePolicy::Never);
        resolver.resolve("tests.can_eat").unwrap();
        resolver.resolve_spec(Permission::new("tests", "can_eat").into()).unwrap();
        assert_eq!(resolver.catalog().lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_cache_always_hits_catalog() {
        let resolver = counting(CachePolicy::Disabled);
        resolver.resolve("tests.can_eat").unwrap();
        resolver.resolve("tests.can_eat").unwrap();
        assert_eq!(resolver.catalog().lookups.load(Ordering::SeqCst), 2);
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_try_resolve_folds_not_found_only() {
        let resolver = counting(CachePolicy::Never);
        assert_eq!(resolver.try_resolve("bogus.nope".into()).unwrap(), None);
        assert!(resolver.try_resolve("malformed".into()).is_err());

        let given = Permission::new("anything", "goes");
        assert_eq!(resolver.try_resolve((&given).into()).unwrap(), Some(given));
    }

    #[test]
    fn test_concurrent_first_resolution_converges() {
        let resolver = std::sync::Arc::new(counting(CachePolicy::Never));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = resolver.clone();
                std::thread::spawn(move || r.resolve("tests.can_be_awesome").unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Permission::new("tests", "can_be_awesome"));
        }
        assert_eq!(resolver.cache().len(), 1);
    }
}
