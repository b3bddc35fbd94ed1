//! In-process grant table.
//!
//! Rows live in a copy-on-write `Arc<Vec<Grant>>`: writers swap in a new
//! vector under the lock, scans clone the `Arc` and filter it lazily without
//! holding the lock. Every scan therefore sees exactly one snapshot.

use std::sync::{Arc, RwLock};

use super::{GrantFilter, GrantScan, GrantStore};
use crate::error::{AccessError, Result};
use crate::primitives::{EntityRef, Grant, Permission};
use crate::types::{new_grant_id, GrantId};

#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    rows: RwLock<Arc<Vec<Grant>>>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_grants(grants: Vec<Grant>) -> Self {
        MemoryGrantStore { rows: RwLock::new(Arc::new(grants)) }
    }

    /// The current table, as one consistent copy.
    pub fn snapshot(&self) -> Result<Arc<Vec<Grant>>> {
        let rows = self.rows.read().map_err(|e| AccessError::storage("grant table", e))?;
        Ok(Arc::clone(&rows))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.snapshot()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.snapshot()?.is_empty())
    }

    /// Replaces the whole table. Used by backends that persist before publishing.
    pub(crate) fn replace(&self, grants: Vec<Grant>) -> Result<()> {
        let mut rows = self.rows.write().map_err(|e| AccessError::storage("grant table", e))?;
        *rows = Arc::new(grants);
        Ok(())
    }

    /// Removes rows matching `predicate` in one atomic step, returning the count.
    fn delete_where(&self, predicate: impl Fn(&Grant) -> bool) -> Result<usize> {
        let mut rows = self.rows.write().map_err(|e| AccessError::storage("grant table", e))?;
        let before = rows.len();
        Arc::make_mut(&mut *rows).retain(|g| !predicate(g));
        Ok(before - rows.len())
    }
}

/// Whether `grant` is exactly the `(holder, target, permission)` triple.
pub(crate) fn is_triple(grant: &Grant, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> bool {
    &grant.holder == holder && grant.target.as_ref() == target && &grant.permission == permission
}

pub(crate) fn new_grant(holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Grant {
    Grant {
        id: new_grant_id(),
        holder: holder.clone(),
        target: target.cloned(),
        permission: permission.clone(),
    }
}

impl GrantStore for MemoryGrantStore {
    fn insert(&self, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Result<GrantId> {
        let grant = new_grant(holder, target, permission);
        let id = grant.id;
        let mut rows = self.rows.write().map_err(|e| AccessError::storage("grant table", e))?;
        Arc::make_mut(&mut *rows).push(grant);
        Ok(id)
    }

    fn delete(&self, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Result<usize> {
        self.delete_where(|g| is_triple(g, holder, target, permission))
    }

    fn delete_all_for_holder(&self, holder: &EntityRef) -> Result<usize> {
        self.delete_where(|g| &g.holder == holder)
    }

    fn scan(&self, filter: &GrantFilter) -> Result<GrantScan<'_>> {
        Ok(Box::new(SnapshotScan {
            rows: self.snapshot()?,
            pos: 0,
            filter: filter.clone(),
        }))
    }
}

/// Lazy filter over one table snapshot.
struct SnapshotScan {
    rows: Arc<Vec<Grant>>,
    pos: usize,
    filter: GrantFilter,
}

impl Iterator for SnapshotScan {
    type Item = Grant;

    fn next(&mut self) -> Option<Grant> {
        while let Some(grant) = self.rows.get(self.pos) {
            self.pos += 1;
            if self.filter.matches(grant) {
                return Some(grant.clone());
            }
        }
        None
    }
}
