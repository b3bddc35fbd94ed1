//! Durable grant table kept in a single JSON file.
//!
//! Every mutation builds the next table, writes it to a sibling temp file,
//! renames it over the original, and only then publishes it to readers. A
//! failed write leaves both the file and the in-memory table untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::memory::{is_triple, new_grant};
use super::{GrantFilter, GrantScan, GrantStore, MemoryGrantStore};
use crate::error::{AccessError, Result};
use crate::primitives::{EntityRef, Grant, Permission};
use crate::types::GrantId;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct GrantFile {
    version: u32,
    grants: Vec<Grant>,
}

#[derive(Debug)]
pub struct JsonFileGrantStore {
    path: PathBuf,
    table: MemoryGrantStore,
    // Serialises writers so each one persists from the latest table.
    write_lock: Mutex<()>,
}

impl JsonFileGrantStore {
    /// Opens the store at `path`, creating an empty one if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let grants = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| AccessError::storage(&format!("reading {}", path.display()), e))?;
            let file: GrantFile = serde_json::from_str(&raw)
                .map_err(|e| AccessError::storage(&format!("parsing {}", path.display()), e))?;
            if file.version != FORMAT_VERSION {
                return Err(AccessError::StorageUnavailable(format!(
                    "{} has format version {}, expected {}",
                    path.display(),
                    file.version,
                    FORMAT_VERSION
                )));
            }
            file.grants
        } else {
            Vec::new()
        };
        tracing::debug!(path = %path.display(), grants = grants.len(), "opened grant file");
        Ok(JsonFileGrantStore {
            path,
            table: MemoryGrantStore::from_grants(grants),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, grants: &[Grant]) -> Result<()> {
        let file = GrantFile { version: FORMAT_VERSION, grants: grants.to_vec() };
        let body = serde_json::to_string_pretty(&file)
            .map_err(|e| AccessError::storage("serialising grants", e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| AccessError::storage(&format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| AccessError::storage(&format!("replacing {}", self.path.display()), e))
    }

    /// Applies `edit` to a copy of the table, persists it, then publishes it.
    fn mutate<T>(&self, edit: impl FnOnce(&mut Vec<Grant>) -> T) -> Result<T> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::clone(&*self.table.snapshot()?);
        let out = edit(&mut next);
        self.persist(&next)?;
        self.table.replace(next)?;
        Ok(out)
    }
}

impl GrantStore for JsonFileGrantStore {
    fn insert(&self, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Result<GrantId> {
        let grant = new_grant(holder, target, permission);
        let id = grant.id;
        self.mutate(|rows| rows.push(grant))?;
        Ok(id)
    }

    fn delete(&self, holder: &EntityRef, target: Option<&EntityRef>, permission: &Permission) -> Result<usize> {
        self.mutate(|rows| {
            let before = rows.len();
            rows.retain(|g| !is_triple(g, holder, target, permission));
            before - rows.len()
        })
    }

    fn delete_all_for_holder(&self, holder: &EntityRef) -> Result<usize> {
        self.mutate(|rows| {
            let before = rows.len();
            rows.retain(|g| &g.holder != holder);
            before - rows.len()
        })
    }

    fn scan(&self, filter: &GrantFilter) -> Result<GrantScan<'_>> {
        self.table.scan(filter)
    }
}
