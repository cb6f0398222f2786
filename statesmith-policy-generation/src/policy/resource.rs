//! Resource policy generation for the shared state bucket and lock table
//!
//! Each document carries exactly two statements: an `AllowAccess` grant
//! narrowed by `aws:PrincipalArn` patterns, and an `EnforceTLS` deny of all
//! non-TLS requests. The grant uses a wildcard principal plus condition
//! rather than direct principal references: a referenced identity must
//! exist when the policy is attached, and cross-account creation order
//! cannot guarantee that, so principal validation is deferred to request
//! time. Statement order is irrelevant to evaluation (an explicit Deny
//! always overrides an Allow); both statements must simply be present.

use crate::document::{ConditionOperator, PolicyDocument, Principal, Statement};
use crate::errors::{PolicyError, Result};

/// Actions remote-state plumbing needs on the state bucket.
const STATE_BUCKET_ACTIONS: &[&str] = &[
    "s3:DeleteObject",
    "s3:GetObject",
    "s3:ListBucket",
    "s3:PutObject",
];

/// Actions the state-locking protocol needs on the lock table.
const LOCK_TABLE_ACTIONS: &[&str] = &[
    "dynamodb:DeleteItem",
    "dynamodb:GetItem",
    "dynamodb:PutItem",
];

/// Build the bucket policy for the shared state bucket. Covers both the
/// bucket itself (list operations) and every object under it.
pub fn state_bucket_policy(
    bucket_arn: &str,
    principal_patterns: &[String],
) -> Result<PolicyDocument> {
    access_policy(
        vec![bucket_arn.to_string(), format!("{bucket_arn}/*")],
        STATE_BUCKET_ACTIONS,
        principal_patterns,
    )
}

/// Build the resource policy for the shared lock table.
pub fn lock_table_policy(
    table_arn: &str,
    principal_patterns: &[String],
) -> Result<PolicyDocument> {
    access_policy(
        vec![table_arn.to_string()],
        LOCK_TABLE_ACTIONS,
        principal_patterns,
    )
}

fn access_policy(
    resources: Vec<String>,
    actions: &[&str],
    principal_patterns: &[String],
) -> Result<PolicyDocument> {
    if principal_patterns.is_empty() {
        return Err(PolicyError::configuration_validation(
            "principal_patterns",
            "must list at least one principal ARN pattern allowed to access the resource",
        ));
    }

    let mut document = PolicyDocument::new();

    document.add_statement(
        Statement::allow(actions.iter().map(|action| (*action).to_string()).collect())
            .with_sid("AllowAccess")
            .with_principal(Principal::any_aws())
            .with_resources(resources.clone())
            .with_condition(
                ConditionOperator::ArnLike,
                "aws:PrincipalArn",
                principal_patterns.to_vec(),
            ),
    );

    document.add_statement(
        Statement::deny(vec!["*".to_string()])
            .with_sid("EnforceTLS")
            .with_principal(Principal::any_aws())
            .with_resources(resources)
            .with_condition(
                ConditionOperator::Bool,
                "aws:SecureTransport",
                vec!["false".to_string()],
            ),
    );

    Ok(document)
}
