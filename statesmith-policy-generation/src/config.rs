//! Per-project configuration and pre-flight validation
//!
//! Everything here is validated before any document is generated: a bad
//! enum value or out-of-range number must surface with the offending field
//! name and the allowed set, never as a half-built document handed to the
//! provisioning layer.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{PolicyError, Result};
use crate::matching::StringLikePattern;
use crate::policy::permissions::{validate_statement_spec, PermissionMode};

/// Smallest role session duration the role-creation API accepts, in seconds.
pub const MIN_SESSION_DURATION_SECS: u32 = 3600;
/// Largest role session duration the role-creation API accepts, in seconds.
pub const MAX_SESSION_DURATION_SECS: u32 = 43200;

/// A caller-supplied policy statement for the `custom` permission mode.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatementSpec {
    /// Statement ID.
    pub sid: String,
    /// "Allow" or "Deny".
    pub effect: String,
    /// IAM actions, non-empty.
    pub actions: Vec<String>,
    /// Resource ARNs, non-empty.
    pub resources: Vec<String>,
    /// Condition block: operator, then condition key, then value list.
    #[serde(default)]
    pub conditions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// Configuration for one deployment environment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Region the execution role is scoped to.
    pub region: String,
    /// One of "broad", "hardened", "custom".
    pub permissions_mode: String,
    /// Require an MFA-backed session to assume the environment's role.
    #[serde(default)]
    pub require_mfa: bool,
    /// Maximum role session duration in seconds, if overridden.
    #[serde(default)]
    pub max_session_duration: Option<u32>,
    /// Statements for the `custom` mode; must be empty for other modes.
    #[serde(default)]
    pub additional_permissions: Vec<StatementSpec>,
    /// ARN patterns of principals allowed to assume the environment's role.
    pub principal_patterns: Vec<String>,
}

impl EnvironmentConfig {
    /// Parse the configured mode string into its tagged form.
    ///
    /// `custom` takes its statements from `additional_permissions`, which
    /// must be non-empty; the fixed modes must not carry extra statements,
    /// since those would silently widen a tier that is meant to be fixed.
    pub fn permission_mode(&self, field_prefix: &str) -> Result<PermissionMode> {
        match self.permissions_mode.as_str() {
            "broad" | "hardened" if !self.additional_permissions.is_empty() => {
                Err(PolicyError::configuration_validation(
                    format!("{field_prefix}.additional_permissions"),
                    format!(
                        "must be empty when permissions_mode is \"{}\"; use \"custom\" to supply statements",
                        self.permissions_mode
                    ),
                ))
            }
            "broad" => Ok(PermissionMode::Broad),
            "hardened" => Ok(PermissionMode::Hardened),
            "custom" if self.additional_permissions.is_empty() => {
                Err(PolicyError::configuration_validation(
                    format!("{field_prefix}.additional_permissions"),
                    "must contain at least one statement when permissions_mode is \"custom\"",
                ))
            }
            "custom" => Ok(PermissionMode::Custom(self.additional_permissions.clone())),
            other => Err(PolicyError::configuration_validation(
                format!("{field_prefix}.permissions_mode"),
                format!(
                    "{other:?} is not a permission mode; expected one of \"broad\", \"hardened\", \"custom\""
                ),
            )),
        }
    }

    /// Validate the environment configuration.
    pub fn validate(&self, field_prefix: &str) -> Result<()> {
        if self.region.is_empty() {
            return Err(PolicyError::configuration_validation(
                format!("{field_prefix}.region"),
                "must name the region the execution role is scoped to",
            ));
        }

        let mode = self.permission_mode(field_prefix)?;
        if let PermissionMode::Custom(statements) = &mode {
            for (index, statement) in statements.iter().enumerate() {
                validate_statement_spec(
                    statement,
                    &format!("{field_prefix}.additional_permissions[{index}]"),
                )?;
            }
        }

        if let Some(duration) = self.max_session_duration {
            if !(MIN_SESSION_DURATION_SECS..=MAX_SESSION_DURATION_SECS).contains(&duration) {
                return Err(PolicyError::configuration_validation(
                    format!("{field_prefix}.max_session_duration"),
                    format!(
                        "{duration} is out of range; must be between {MIN_SESSION_DURATION_SECS} and {MAX_SESSION_DURATION_SECS} seconds"
                    ),
                ));
            }
        }

        if self.principal_patterns.is_empty() {
            return Err(PolicyError::configuration_validation(
                format!("{field_prefix}.principal_patterns"),
                "must list at least one principal ARN pattern allowed to assume the role",
            ));
        }
        for pattern in &self.principal_patterns {
            StringLikePattern::compile(pattern)?;
        }

        Ok(())
    }
}

/// Top-level configuration: the project's account naming prefix, the shared
/// remote-state resources, and each environment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OrgConfig {
    /// Account naming prefix, e.g. "proj-". Accounts outside this prefix
    /// never resolve into the project.
    pub project: String,
    /// Name of the shared state bucket.
    pub state_bucket: String,
    /// Name of the shared lock table.
    pub lock_table: String,
    /// Region hosting the shared state resources.
    pub state_region: String,
    /// Account hosting the shared state resources (current caller account).
    pub state_account: String,
    /// Environment name to configuration.
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

impl OrgConfig {
    /// Validate the whole configuration before any generation.
    pub fn validate(&self) -> Result<()> {
        if self.project.is_empty() {
            return Err(PolicyError::configuration_validation(
                "project",
                "must be a non-empty account naming prefix",
            ));
        }
        if self.state_bucket.is_empty() {
            return Err(PolicyError::configuration_validation(
                "state_bucket",
                "must name the shared state bucket",
            ));
        }
        if self.lock_table.is_empty() {
            return Err(PolicyError::configuration_validation(
                "lock_table",
                "must name the shared lock table",
            ));
        }
        if self.state_region.is_empty() {
            return Err(PolicyError::configuration_validation(
                "state_region",
                "must name the region hosting the shared state resources",
            ));
        }
        if self.state_account.len() != 12 || !self.state_account.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PolicyError::configuration_validation(
                "state_account",
                "must be a twelve-digit account identifier",
            ));
        }
        if self.environments.is_empty() {
            return Err(PolicyError::configuration_validation(
                "environments",
                "must configure at least one environment",
            ));
        }

        for (name, environment) in &self.environments {
            environment.validate(&format!("environments.{name}"))?;
        }

        Ok(())
    }

    /// The environment names this configuration recognizes.
    pub fn recognized_environments(&self) -> Vec<String> {
        self.environments.keys().cloned().collect()
    }
}
