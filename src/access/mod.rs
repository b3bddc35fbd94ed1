//! Holder-scoped access handles.
//!
//! A [`HolderAccess`] binds a kernel to one principal so call sites read as
//! `kernel.for_holder(user).has_perm("tests.can_eat", Some(&apple))`.

pub mod holder;

pub use holder::HolderAccess;
