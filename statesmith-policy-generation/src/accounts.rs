//! Organization account resolution
//!
//! Maps an organization's account inventory to the environments configured
//! for a project. Resolution is a pure function over the inventory and is
//! recomputed on demand rather than cached, so a changed inventory is never
//! served stale.

use std::collections::BTreeMap;

use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry of the organization account inventory, as reported by the
/// external directory service.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OrgAccount {
    /// Account name, e.g. "proj-dev".
    pub name: String,
    /// Twelve-digit account identifier.
    pub id: String,
}

/// Resolve environment names to account identifiers.
///
/// Keeps only accounts whose name starts with `project_prefix` and whose
/// remainder after the prefix is one of the `recognized` environment names.
/// An account named exactly like an environment but without the prefix is
/// excluded; another project's "dev" must never resolve into this one.
///
/// A recognized environment with no matching account is simply absent from
/// the result. Callers skip generation for absent environments instead of
/// failing.
pub fn resolve_environment_accounts(
    accounts: &[OrgAccount],
    project_prefix: &str,
    recognized: &[String],
) -> BTreeMap<String, String> {
    let mut resolved = BTreeMap::new();

    for account in accounts {
        let Some(environment) = account.name.strip_prefix(project_prefix) else {
            continue;
        };
        if !recognized.iter().any(|name| name == environment) {
            continue;
        }
        if let Some(existing) = resolved.insert(environment.to_string(), account.id.clone()) {
            warn!(
                "Duplicate account for environment {}: keeping {}, ignoring {}",
                environment, account.id, existing
            );
        }
    }

    resolved
}
