//! Trust policy generation
//!
//! Builds the assume-role trust document for an environment's execution
//! role. The `Principal` element of a trust policy is exact-match only, so
//! pattern semantics live in an `ArnLike aws:PrincipalArn` condition: the
//! principal is the wildcard and the condition carries the caller's pattern
//! set unchanged. This also avoids referencing identities that may not
//! exist yet at role-creation time.

use crate::document::{ConditionOperator, PolicyDocument, Principal, Statement};
use crate::errors::{PolicyError, Result};

/// Build a trust document allowing the given principal patterns to assume
/// the role. Patterns may be exact ARNs or carry `*`/`?` wildcards; both
/// are evaluated with string-like semantics.
///
/// With `require_mfa`, assumption additionally requires an MFA-backed
/// session.
pub fn build_trust_policy(
    principal_patterns: &[String],
    require_mfa: bool,
) -> Result<PolicyDocument> {
    if principal_patterns.is_empty() {
        return Err(PolicyError::configuration_validation(
            "principal_patterns",
            "must list at least one principal ARN pattern",
        ));
    }

    let mut statement = Statement::allow(vec!["sts:AssumeRole".to_string()])
        .with_sid("AllowAssumeRole")
        .with_principal(Principal::any_aws())
        .with_condition(
            ConditionOperator::ArnLike,
            "aws:PrincipalArn",
            principal_patterns.to_vec(),
        );

    if require_mfa {
        statement = statement.with_condition(
            ConditionOperator::Bool,
            "aws:MultiFactorAuthPresent",
            vec!["true".to_string()],
        );
    }

    let mut document = PolicyDocument::new();
    document.add_statement(statement);
    Ok(document)
}
