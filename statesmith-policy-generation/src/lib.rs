//! This crate provides the core logic for statesmith:
//! - Organization account resolution for a project's environments
//! - Trust and resource policy document generation
//! - Execution-role permission set composition
//! - Backend state access scoped by key prefix
//!
//! All generation is pure, synchronous document assembly over the supplied
//! inputs; concurrency around the shared state itself (locking, conditional
//! writes) is the provisioning layer's concern, not this crate's.

mod accounts;
pub mod api;
mod config;
mod document;
mod errors;
mod matching;
mod policy;

// Re-exports for a small, focused public API
pub use accounts::{resolve_environment_accounts, OrgAccount};
pub use api::{
    execution_role_arn, generate_environment_policies, generate_shared_state_policies,
    EnvironmentPolicySet, SharedStatePolicies,
};
pub use config::{
    EnvironmentConfig, OrgConfig, StatementSpec, MAX_SESSION_DURATION_SECS,
    MIN_SESSION_DURATION_SECS,
};
pub use document::{
    ConditionOperator, Effect, PolicyDocument, Principal, Statement, POLICY_VERSION,
};
pub use errors::{PolicyError, Result};
pub use matching::{string_like_match, StringLikePattern};
pub use policy::{
    backend_access_policy, build_trust_policy, compose_permission_set, lock_table_policy,
    state_bucket_policy, PermissionMode, StateKeyPrefix,
};
