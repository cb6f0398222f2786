//! Public generation API
//!
//! Ties the components together: validates the configuration, resolves the
//! organization inventory to environments, and produces the per-environment
//! and shared-resource documents. An environment with no resolved account
//! is skipped with a warning; the provisioning layer sees a count of zero
//! for it, never an error.

use log::{debug, warn};

use crate::accounts::{resolve_environment_accounts, OrgAccount};
use crate::config::OrgConfig;
use crate::document::PolicyDocument;
use crate::errors::Result;
use crate::policy::{
    backend_access_policy, build_trust_policy, compose_permission_set, lock_table_policy,
    state_bucket_policy, StateKeyPrefix,
};

/// The documents generated for one environment's execution role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentPolicySet {
    /// Environment name.
    pub environment: String,
    /// Account the environment resolved to.
    pub account_id: String,
    /// Trust document for the execution role.
    pub trust_policy: PolicyDocument,
    /// Identity policy composed from the environment's permission mode.
    pub permissions_policy: PolicyDocument,
    /// Identity policy granting access to the environment's state subtree.
    pub backend_access_policy: PolicyDocument,
}

/// The documents attached to the shared state resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedStatePolicies {
    /// Bucket policy for the state bucket.
    pub state_bucket_policy: PolicyDocument,
    /// Resource policy for the lock table.
    pub lock_table_policy: PolicyDocument,
}

/// ARN of the execution role provisioned for an environment.
pub fn execution_role_arn(account_id: &str, project: &str, environment: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{project}{environment}-execution")
}

fn state_bucket_arn(config: &OrgConfig) -> String {
    format!("arn:aws:s3:::{}", config.state_bucket)
}

fn lock_table_arn(config: &OrgConfig) -> String {
    format!(
        "arn:aws:dynamodb:{}:{}:table/{}",
        config.state_region, config.state_account, config.lock_table
    )
}

/// Generate the per-environment document sets.
///
/// Validates the configuration up front, then emits one
/// [`EnvironmentPolicySet`] per environment that resolves to an account.
/// Identical inputs produce byte-identical serialized documents.
pub fn generate_environment_policies(
    config: &OrgConfig,
    accounts: &[OrgAccount],
) -> Result<Vec<EnvironmentPolicySet>> {
    config.validate()?;

    let resolved =
        resolve_environment_accounts(accounts, &config.project, &config.recognized_environments());
    let bucket_arn = state_bucket_arn(config);
    let table_arn = lock_table_arn(config);

    let mut sets = Vec::new();
    for (environment, env_config) in &config.environments {
        let Some(account_id) = resolved.get(environment) else {
            warn!(
                "No account named {}{} in the organization inventory; skipping environment {}",
                config.project, environment, environment
            );
            continue;
        };
        debug!("Generating documents for environment {} in account {}", environment, account_id);

        let mode = env_config.permission_mode(&format!("environments.{environment}"))?;
        let prefix = StateKeyPrefix::for_environment(environment);

        sets.push(EnvironmentPolicySet {
            environment: environment.clone(),
            account_id: account_id.clone(),
            trust_policy: build_trust_policy(
                &env_config.principal_patterns,
                env_config.require_mfa,
            )?,
            permissions_policy: compose_permission_set(&mode, &env_config.region, account_id)?,
            backend_access_policy: backend_access_policy(&bucket_arn, &table_arn, &prefix),
        });
    }

    Ok(sets)
}

/// Generate the shared state bucket and lock table policies.
///
/// The allowed principal set is the union of every resolved environment's
/// execution-role ARN pattern; unresolved environments contribute nothing.
pub fn generate_shared_state_policies(
    config: &OrgConfig,
    accounts: &[OrgAccount],
) -> Result<SharedStatePolicies> {
    config.validate()?;

    let resolved =
        resolve_environment_accounts(accounts, &config.project, &config.recognized_environments());

    // BTreeMap iteration keeps the pattern list sorted by environment name.
    let principal_patterns: Vec<String> = resolved
        .iter()
        .map(|(environment, account_id)| {
            execution_role_arn(account_id, &config.project, environment)
        })
        .collect();

    Ok(SharedStatePolicies {
        state_bucket_policy: state_bucket_policy(&state_bucket_arn(config), &principal_patterns)?,
        lock_table_policy: lock_table_policy(&lock_table_arn(config), &principal_patterns)?,
    })
}
