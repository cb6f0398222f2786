//! Execution-role permission set composition
//!
//! Produces the identity policy attached to an environment's execution
//! role. Whatever the mode, the composed document never grants IAM write
//! permissions; IAM mutation belongs to a separate control-plane identity,
//! not to the role being composed here.

use crate::config::StatementSpec;
use crate::document::{ConditionOperator, Effect, PolicyDocument, Statement};
use crate::errors::{PolicyError, Result};

/// The execution role's capability tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionMode {
    /// Wide service access; IAM stays read-only.
    Broad,
    /// Minimal fixed statement set. Production and staging environments are
    /// expected to run identical hardened tiers.
    Hardened,
    /// Statements supplied entirely by the caller.
    Custom(Vec<StatementSpec>),
}

/// Service wildcards granted by the broad tier. IAM is deliberately absent;
/// it is granted read-only in its own statement.
const BROAD_SERVICE_ACTIONS: &[&str] = &[
    "autoscaling:*",
    "cloudfront:*",
    "cloudwatch:*",
    "dynamodb:*",
    "ec2:*",
    "ecr:*",
    "ecs:*",
    "eks:*",
    "elasticloadbalancing:*",
    "events:*",
    "kms:*",
    "lambda:*",
    "logs:*",
    "rds:*",
    "route53:*",
    "s3:*",
    "secretsmanager:*",
    "sns:*",
    "sqs:*",
    "ssm:*",
];

const READ_ONLY_IAM_ACTIONS: &[&str] = &["iam:Get*", "iam:List*"];

const COMPUTE_LIFECYCLE_ACTIONS: &[&str] = &[
    "ec2:CreateTags",
    "ec2:Describe*",
    "ec2:RunInstances",
    "ec2:StartInstances",
    "ec2:StopInstances",
    "ec2:TerminateInstances",
];

const CONTAINER_LIFECYCLE_ACTIONS: &[&str] = &[
    "ecr:BatchGetImage",
    "ecr:GetAuthorizationToken",
    "ecr:GetDownloadUrlForLayer",
    "ecs:Describe*",
    "ecs:DeregisterTaskDefinition",
    "ecs:List*",
    "ecs:RegisterTaskDefinition",
    "ecs:RunTask",
    "ecs:StopTask",
];

const LOG_DELIVERY_ACTIONS: &[&str] = &[
    "logs:CreateLogGroup",
    "logs:CreateLogStream",
    "logs:DescribeLogGroups",
    "logs:DescribeLogStreams",
    "logs:PutLogEvents",
];

const TAGGING_ACTIONS: &[&str] = &["tag:GetResources", "tag:GetTagKeys", "tag:GetTagValues"];

const QUOTA_READ_ACTIONS: &[&str] =
    &["servicequotas:GetServiceQuota", "servicequotas:ListServiceQuotas"];

/// Compose the identity policy for an execution role.
///
/// Every statement is scoped to `region` through an
/// `aws:RequestedRegion` condition.
pub fn compose_permission_set(
    mode: &PermissionMode,
    region: &str,
    account_id: &str,
) -> Result<PolicyDocument> {
    let mut document = PolicyDocument::new();

    match mode {
        PermissionMode::Broad => {
            document.add_statement(region_scoped(
                Statement::allow(owned(BROAD_SERVICE_ACTIONS))
                    .with_sid("BroadServiceAccess")
                    .with_resources(vec!["*".to_string()]),
                region,
            ));
            document.add_statement(region_scoped(read_only_iam_statement(), region));
        }
        PermissionMode::Hardened => {
            document.add_statement(region_scoped(
                Statement::allow(owned(COMPUTE_LIFECYCLE_ACTIONS))
                    .with_sid("ComputeLifecycle")
                    .with_resources(vec!["*".to_string()]),
                region,
            ));
            document.add_statement(region_scoped(
                Statement::allow(owned(CONTAINER_LIFECYCLE_ACTIONS))
                    .with_sid("ContainerLifecycle")
                    .with_resources(vec!["*".to_string()]),
                region,
            ));
            document.add_statement(region_scoped(read_only_iam_statement(), region));
            document.add_statement(region_scoped(
                Statement::allow(owned(LOG_DELIVERY_ACTIONS))
                    .with_sid("LogDelivery")
                    .with_resources(vec![format!("arn:aws:logs:{region}:{account_id}:*")]),
                region,
            ));
            document.add_statement(region_scoped(
                Statement::allow(owned(TAGGING_ACTIONS))
                    .with_sid("ResourceTagging")
                    .with_resources(vec!["*".to_string()]),
                region,
            ));
            document.add_statement(region_scoped(
                Statement::allow(owned(QUOTA_READ_ACTIONS))
                    .with_sid("QuotaRead")
                    .with_resources(vec!["*".to_string()]),
                region,
            ));
        }
        PermissionMode::Custom(statements) => {
            for (index, spec) in statements.iter().enumerate() {
                validate_statement_spec(spec, &format!("additional_permissions[{index}]"))?;
                document.add_statement(region_scoped(statement_from_spec(spec)?, region));
            }
        }
    }

    // Invariant across all modes, including future built-in tiers.
    for statement in &document.statement {
        for action in &statement.action {
            if is_iam_write_action(action) {
                return Err(PolicyError::configuration_validation(
                    "permissions_mode",
                    format!("composed statement grants IAM write action {action:?}"),
                ));
            }
        }
    }

    Ok(document)
}

fn read_only_iam_statement() -> Statement {
    Statement::allow(owned(READ_ONLY_IAM_ACTIONS))
        .with_sid("ReadOnlyIam")
        .with_resources(vec!["*".to_string()])
}

fn region_scoped(statement: Statement, region: &str) -> Statement {
    statement.with_condition(
        ConditionOperator::StringEquals,
        "aws:RequestedRegion",
        vec![region.to_string()],
    )
}

fn owned(actions: &[&str]) -> Vec<String> {
    actions.iter().map(|action| (*action).to_string()).collect()
}

/// Whether an action mutates IAM. Only `iam:Get*` and `iam:List*` are
/// considered reads; everything else under the `iam:` prefix (including
/// `iam:*` and `iam:PassRole`) is treated as a write.
pub(crate) fn is_iam_write_action(action: &str) -> bool {
    let Some(operation) = action.strip_prefix("iam:") else {
        return false;
    };
    !(operation.starts_with("Get") || operation.starts_with("List"))
}

/// Validate a caller-supplied statement before it is composed.
pub fn validate_statement_spec(spec: &StatementSpec, field: &str) -> Result<()> {
    parse_effect(&spec.effect, field)?;

    if spec.actions.is_empty() {
        return Err(PolicyError::configuration_validation(
            format!("{field}.actions"),
            "must list at least one action",
        ));
    }
    if spec.resources.is_empty() {
        return Err(PolicyError::configuration_validation(
            format!("{field}.resources"),
            "must list at least one resource ARN",
        ));
    }

    for action in &spec.actions {
        if is_iam_write_action(action) {
            return Err(PolicyError::configuration_validation(
                format!("{field}.actions"),
                format!(
                    "{action:?} is an IAM write action; IAM mutation is reserved for the control-plane identity"
                ),
            ));
        }
        if action == "*" && spec.effect == "Allow" {
            return Err(PolicyError::configuration_validation(
                format!("{field}.actions"),
                "\"*\" would grant IAM write actions; list explicit service actions instead",
            ));
        }
    }

    for operator in spec.conditions.keys() {
        parse_condition_operator(operator, field)?;
    }

    Ok(())
}

fn statement_from_spec(spec: &StatementSpec) -> Result<Statement> {
    let effect = parse_effect(&spec.effect, "additional_permissions")?;
    let mut statement = match effect {
        Effect::Allow => Statement::allow(spec.actions.clone()),
        Effect::Deny => Statement::deny(spec.actions.clone()),
    };
    statement = statement
        .with_sid(spec.sid.clone())
        .with_resources(spec.resources.clone());

    for (operator, entries) in &spec.conditions {
        let operator = parse_condition_operator(operator, "additional_permissions")?;
        for (key, values) in entries {
            statement = statement.with_condition(operator, key.clone(), values.clone());
        }
    }

    Ok(statement)
}

fn parse_effect(effect: &str, field: &str) -> Result<Effect> {
    match effect {
        "Allow" => Ok(Effect::Allow),
        "Deny" => Ok(Effect::Deny),
        other => Err(PolicyError::configuration_validation(
            format!("{field}.effect"),
            format!("{other:?} is not an effect; expected \"Allow\" or \"Deny\""),
        )),
    }
}

fn parse_condition_operator(operator: &str, field: &str) -> Result<ConditionOperator> {
    match operator {
        "ArnLike" => Ok(ConditionOperator::ArnLike),
        "Bool" => Ok(ConditionOperator::Bool),
        "StringEquals" => Ok(ConditionOperator::StringEquals),
        "StringLike" => Ok(ConditionOperator::StringLike),
        other => Err(PolicyError::configuration_validation(
            format!("{field}.conditions"),
            format!(
                "{other:?} is not a supported condition operator; expected one of \"ArnLike\", \"Bool\", \"StringEquals\", \"StringLike\""
            ),
        )),
    }
}
