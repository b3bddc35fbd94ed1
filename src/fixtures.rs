//! Shared test fixtures: a fruit-themed catalog, an auth user/group model and
//! a kernel wired over in-memory collaborators.
//!
//! Available to the crate's own tests and, through the `test-utils` feature,
//! to integration tests and benches.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::MemoryCatalog;
use crate::config::Settings;
use crate::directory::{EntityLoader, MembershipTable, StaticTypeRegistry};
use crate::error::{AccessError, Result};
use crate::kernel::Kernel;
use crate::primitives::{EntityRef, Permission, Principal};
use crate::store::{GrantFilter, GrantScan, GrantStore, MemoryGrantStore};
use crate::types::{GrantId, ObjectId};

pub const APPLE: &str = "tests.apple";
pub const ORANGE: &str = "tests.orange";
pub const USER: &str = "auth.user";
pub const GROUP: &str = "auth.group";

pub const CAN_BE_AWESOME: &str = "tests.can_be_awesome";
pub const CAN_EAT: &str = "tests.can_eat";

pub fn apple(id: ObjectId) -> EntityRef {
    EntityRef::new(APPLE, id)
}

pub fn orange(id: ObjectId) -> EntityRef {
    EntityRef::new(ORANGE, id)
}

pub fn user(id: ObjectId) -> EntityRef {
    EntityRef::new(USER, id)
}

pub fn group(id: ObjectId) -> EntityRef {
    EntityRef::new(GROUP, id)
}

pub fn active(entity: EntityRef) -> Principal {
    Principal::new(entity)
}

pub fn catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with("tests", "can_be_awesome")
        .with("tests", "can_eat")
        .with("auth", "add_user")
}

pub fn types() -> StaticTypeRegistry {
    StaticTypeRegistry::new()
        .model(APPLE)
        .model(ORANGE)
        .model(USER)
        .model(GROUP)
        .default_for("tests", APPLE)
}

/// Users reach permissions through the groups whose `user` relation lists them.
pub fn settings() -> Settings {
    Settings::default().with_indirection(GROUP, "user")
}

pub type FixtureKernel = Kernel<Arc<MemoryGrantStore>, MemoryCatalog>;

/// A kernel plus handles on its mutable collaborators.
pub struct Fixture {
    pub kernel: FixtureKernel,
    pub store: Arc<MemoryGrantStore>,
    pub membership: Arc<MembershipTable>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(&settings())
    }

    pub fn with_settings(settings: &Settings) -> Self {
        let store = Arc::new(MemoryGrantStore::new());
        let membership = Arc::new(MembershipTable::new());
        let kernel = Kernel::from_settings(settings, store.clone(), catalog(), Arc::new(types()), membership.clone())
            .unwrap_or_else(|e| panic!("fixture settings rejected: {e}"));
        Fixture { kernel, store, membership }
    }

    pub fn join(&self, member: &EntityRef, group: &EntityRef) {
        self.membership.add_member(group, "user", member);
    }

    pub fn leave(&self, member: &EntityRef, group: &EntityRef) -> bool {
        self.membership.remove_member(group, "user", member)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A grant store whose backend is permanently down.
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn down<T>() -> Result<T> {
        Err(AccessError::StorageUnavailable("grant store offline".into()))
    }
}

impl GrantStore for UnavailableStore {
    fn insert(&self, _: &EntityRef, _: Option<&EntityRef>, _: &Permission) -> Result<GrantId> {
        Self::down()
    }

    fn delete(&self, _: &EntityRef, _: Option<&EntityRef>, _: &Permission) -> Result<usize> {
        Self::down()
    }

    fn delete_all_for_holder(&self, _: &EntityRef) -> Result<usize> {
        Self::down()
    }

    fn scan(&self, _: &GrantFilter) -> Result<GrantScan<'_>> {
        Self::down()
    }
}

/// Kernel over [`UnavailableStore`], otherwise configured like [`Fixture`].
pub fn unavailable_kernel() -> Kernel<UnavailableStore, MemoryCatalog> {
    Kernel::from_settings(
        &settings(),
        UnavailableStore,
        catalog(),
        Arc::new(types()),
        Arc::new(MembershipTable::new()),
    )
    .unwrap_or_else(|e| panic!("fixture settings rejected: {e}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fruit {
    pub model: String,
    pub id: ObjectId,
    pub name: String,
}

/// Entity loader over a fixed list of fruit. Unknown ids are skipped.
#[derive(Debug, Default)]
pub struct FruitBasket {
    fruit: Vec<Fruit>,
}

impl FruitBasket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entity: EntityRef, name: &str) -> Self {
        self.fruit.push(Fruit { model: entity.type_tag, id: entity.id, name: name.to_owned() });
        self
    }
}

impl EntityLoader for FruitBasket {
    type Entity = Fruit;

    fn load(&self, model: &str, refs: &BTreeSet<EntityRef>) -> Result<Vec<Fruit>> {
        Ok(self
            .fruit
            .iter()
            .filter(|f| f.model == model && refs.contains(&EntityRef::new(f.model.clone(), f.id)))
            .cloned()
            .collect())
    }
}
