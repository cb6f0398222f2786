//! Policy document builders: trust, shared-resource, and execution-role
//! permission documents.

pub mod permissions;
pub mod resource;
pub mod state_access;
pub mod trust;

pub use permissions::{compose_permission_set, PermissionMode};
pub use resource::{lock_table_policy, state_bucket_policy};
pub use state_access::{backend_access_policy, StateKeyPrefix};
pub use trust::build_trust_policy;
