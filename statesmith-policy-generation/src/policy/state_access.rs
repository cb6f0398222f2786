//! Backend state access scoped by key prefix
//!
//! Every execution role may only touch its own subtree of the shared
//! remote state. The scope guard is a key prefix ("dev/"): listing is
//! conditioned on `s3:prefix`, object access is granted under the prefix
//! only, and lock-table access covers the lock items.

use std::fmt;

use crate::document::{ConditionOperator, PolicyDocument, Statement};

/// A state key prefix tying a role to one subtree of the shared state.
/// Always ends in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateKeyPrefix(String);

impl StateKeyPrefix {
    /// The prefix for an environment's state subtree, e.g. "dev/".
    pub fn for_environment(environment: &str) -> Self {
        Self(format!("{environment}/"))
    }

    /// The prefix as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the identity policy granting an execution role access to its own
/// state subtree and the lock table.
pub fn backend_access_policy(
    bucket_arn: &str,
    table_arn: &str,
    prefix: &StateKeyPrefix,
) -> PolicyDocument {
    let mut document = PolicyDocument::new();

    document.add_statement(
        Statement::allow(vec!["s3:ListBucket".to_string()])
            .with_sid("ListStatePrefix")
            .with_resources(vec![bucket_arn.to_string()])
            .with_condition(
                ConditionOperator::StringLike,
                "s3:prefix",
                vec![format!("{prefix}*")],
            ),
    );

    document.add_statement(
        Statement::allow(vec![
            "s3:DeleteObject".to_string(),
            "s3:GetObject".to_string(),
            "s3:PutObject".to_string(),
        ])
        .with_sid("ReadWriteStateObjects")
        .with_resources(vec![format!("{bucket_arn}/{prefix}*")]),
    );

    document.add_statement(
        Statement::allow(vec![
            "dynamodb:DeleteItem".to_string(),
            "dynamodb:GetItem".to_string(),
            "dynamodb:PutItem".to_string(),
        ])
        .with_sid("StateLocking")
        .with_resources(vec![table_arn.to_string()]),
    );

    document
}
