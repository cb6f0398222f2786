//! IAM policy document model
//!
//! This module provides the serialized form of the documents the rest of
//! the crate produces: trust policies, resource policies, and identity
//! policies all share the same `Version`/`Statement` wire shape. Maps use
//! `BTreeMap` so repeat runs over the same inputs serialize byte-identically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Policy language version accepted by the provisioning layer.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

/// Condition operator on a statement.
///
/// Wildcarded values must use a `...Like` operator; exact-equality operators
/// never see patterns. `Bool` carries flag keys such as
/// `aws:SecureTransport` and `aws:MultiFactorAuthPresent`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConditionOperator {
    ArnLike,
    Bool,
    StringEquals,
    StringLike,
}

/// Statement principal. Only the `AWS` principal form is produced here;
/// role and resource policies both defer pattern validation to an
/// `aws:PrincipalArn` condition, so the principal itself is the wildcard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    #[serde(rename = "AWS")]
    pub aws: String,
}

impl Principal {
    /// Any AWS principal; access is narrowed by statement conditions.
    pub fn any_aws() -> Self {
        Self { aws: "*".to_string() }
    }
}

/// Condition block: operator, then condition key, then value list.
pub type ConditionMap = BTreeMap<ConditionOperator, BTreeMap<String, Vec<String>>>;

/// A single policy statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    /// Present on trust and resource policies, absent on identity policies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Vec<String>,
    /// Absent on trust policies (the role itself is the resource).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub condition: ConditionMap,
}

impl Statement {
    /// Create an Allow statement for the given actions.
    pub fn allow(actions: Vec<String>) -> Self {
        Self::with_effect(Effect::Allow, actions)
    }

    /// Create a Deny statement for the given actions.
    pub fn deny(actions: Vec<String>) -> Self {
        Self::with_effect(Effect::Deny, actions)
    }

    fn with_effect(effect: Effect, actions: Vec<String>) -> Self {
        Self {
            sid: None,
            effect,
            principal: None,
            action: actions,
            resource: None,
            condition: BTreeMap::new(),
        }
    }

    /// Attach a statement ID.
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Attach a principal.
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Attach a resource list.
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resource = Some(resources);
        self
    }

    /// Attach one condition entry. Entries under the same operator merge.
    pub fn with_condition(
        mut self,
        operator: ConditionOperator,
        key: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        self.condition
            .entry(operator)
            .or_default()
            .insert(key.into(), values);
        self
    }
}

/// A complete policy document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// Create an empty document with the standard policy version.
    pub fn new() -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: Vec::new(),
        }
    }

    /// Append a statement to the document.
    pub fn add_statement(&mut self, statement: Statement) {
        self.statement.push(statement);
    }

    /// Serialize to pretty-printed JSON in the standard wire form.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new()
    }
}
