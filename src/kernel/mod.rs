pub mod backend;
pub mod core;
pub mod planner;

pub use self::core::Kernel;
pub use backend::{BackendChain, PermissionBackend};
pub use planner::AccessPlan;
