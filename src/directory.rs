//!
//! Host-side collaborators the kernel consults but does not own: the
//! identity/type registry, group membership, and entity loading.
//!
//! Each comes with a small in-memory implementation, which is what the tests
//! and the fixtures use.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::primitives::EntityRef;
use crate::types::TypeTag;

// --- Type registry ----------------------------------------------------------

/// Knows which model tags exist and which model a permission namespace refers to.
pub trait TypeRegistry: Send + Sync {
    fn is_model(&self, type_tag: &str) -> bool;

    /// Model implied by a permission's namespace when the caller names none.
    fn default_model_for(&self, namespace: &str) -> Option<TypeTag>;
}

impl<T: TypeRegistry + ?Sized> TypeRegistry for Arc<T> {
    fn is_model(&self, type_tag: &str) -> bool {
        (**self).is_model(type_tag)
    }

    fn default_model_for(&self, namespace: &str) -> Option<TypeTag> {
        (**self).default_model_for(namespace)
    }
}

/// Type registry fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticTypeRegistry {
    models: BTreeSet<TypeTag>,
    defaults: HashMap<String, TypeTag>,
}

impl StaticTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, type_tag: &str) -> Self {
        self.models.insert(type_tag.to_owned());
        self
    }

    /// Registers `type_tag` and makes it the default model of `namespace`.
    pub fn default_for(mut self, namespace: &str, type_tag: &str) -> Self {
        self.models.insert(type_tag.to_owned());
        self.defaults.insert(namespace.to_owned(), type_tag.to_owned());
        self
    }
}

impl TypeRegistry for StaticTypeRegistry {
    fn is_model(&self, type_tag: &str) -> bool {
        self.models.contains(type_tag)
    }

    fn default_model_for(&self, namespace: &str) -> Option<TypeTag> {
        self.defaults.get(namespace).cloned()
    }
}

// --- Membership -------------------------------------------------------------

/// Answers "which entities of `model` include `principal` through `attribute`",
/// e.g. the groups whose `user` relation contains a given user.
pub trait MembershipSource: Send + Sync {
    fn intermediaries(
        &self,
        model: &str,
        attribute: &str,
        principal: &EntityRef,
    ) -> Result<Vec<EntityRef>>;
}

impl<T: MembershipSource + ?Sized> MembershipSource for Arc<T> {
    fn intermediaries(
        &self,
        model: &str,
        attribute: &str,
        principal: &EntityRef,
    ) -> Result<Vec<EntityRef>> {
        (**self).intermediaries(model, attribute, principal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Membership {
    intermediary: EntityRef,
    attribute: String,
    member: EntityRef,
}

/// In-memory membership relation, mutable at runtime (people join and leave groups).
#[derive(Debug, Default)]
pub struct MembershipTable {
    rows: RwLock<Vec<Membership>>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `member` belongs to `intermediary` through `attribute`. Idempotent.
    pub fn add_member(&self, intermediary: &EntityRef, attribute: &str, member: &EntityRef) {
        let row = Membership {
            intermediary: intermediary.clone(),
            attribute: attribute.to_owned(),
            member: member.clone(),
        };
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        if !rows.contains(&row) {
            rows.push(row);
        }
    }

    /// Returns whether the membership existed.
    pub fn remove_member(&self, intermediary: &EntityRef, attribute: &str, member: &EntityRef) -> bool {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|r| !(&r.intermediary == intermediary && r.attribute == attribute && &r.member == member));
        rows.len() != before
    }
}

impl MembershipSource for MembershipTable {
    fn intermediaries(
        &self,
        model: &str,
        attribute: &str,
        principal: &EntityRef,
    ) -> Result<Vec<EntityRef>> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows
            .iter()
            .filter(|r| r.intermediary.is_model(model) && r.attribute == attribute && &r.member == principal)
            .map(|r| r.intermediary.clone())
            .collect())
    }
}

// --- Entity loading ---------------------------------------------------------

/// Turns references back into the host's full entities.
pub trait EntityLoader {
    type Entity;

    /// Loads every entity in `refs`, all of which belong to `model`.
    /// References to entities that no longer exist are skipped.
    fn load(&self, model: &str, refs: &BTreeSet<EntityRef>) -> Result<Vec<Self::Entity>>;
}
