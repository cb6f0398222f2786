//! Integration test for the full generation flow
//!
//! Deserializes a configuration and an organization inventory from JSON the
//! way the CLI does, runs generation through the public API, and checks the
//! serialized documents against the guarantees the provisioning layer
//! relies on.

use statesmith_policy_generation::{
    generate_environment_policies, generate_shared_state_policies, string_like_match, Effect,
    OrgAccount, OrgConfig,
};

const CONFIG_JSON: &str = r#"
{
    "project": "proj-",
    "state_bucket": "proj-terraform-state",
    "lock_table": "proj-terraform-locks",
    "state_region": "eu-west-1",
    "state_account": "444444444444",
    "environments": {
        "dev": {
            "region": "eu-west-1",
            "permissions_mode": "broad",
            "principal_patterns": [
                "arn:aws:iam::111111111111:role/aws-reserved/sso.amazonaws.com/*"
            ]
        },
        "stage": {
            "region": "eu-west-1",
            "permissions_mode": "hardened",
            "principal_patterns": [
                "arn:aws:iam::222222222222:role/aws-reserved/sso.amazonaws.com/*"
            ]
        },
        "prod": {
            "region": "eu-west-1",
            "permissions_mode": "hardened",
            "require_mfa": true,
            "max_session_duration": 3600,
            "principal_patterns": [
                "arn:aws:iam::333333333333:role/aws-reserved/sso.amazonaws.com/*"
            ]
        },
        "management": {
            "region": "eu-west-1",
            "permissions_mode": "custom",
            "additional_permissions": [
                {
                    "sid": "OrgRead",
                    "effect": "Allow",
                    "actions": ["organizations:Describe*", "organizations:List*"],
                    "resources": ["*"]
                }
            ],
            "principal_patterns": [
                "arn:aws:iam::444444444444:role/aws-reserved/sso.amazonaws.com/*"
            ]
        }
    }
}
"#;

const ACCOUNTS_JSON: &str = r#"
[
    {"name": "proj-dev", "id": "111111111111"},
    {"name": "proj-stage", "id": "222222222222"},
    {"name": "proj-prod", "id": "333333333333"},
    {"name": "proj-management", "id": "444444444444"},
    {"name": "dev", "id": "999999999999"},
    {"name": "otherproj-prod", "id": "888888888888"}
]
"#;

fn load() -> (OrgConfig, Vec<OrgAccount>) {
    let config: OrgConfig = serde_json::from_str(CONFIG_JSON).expect("config parses");
    let accounts: Vec<OrgAccount> = serde_json::from_str(ACCOUNTS_JSON).expect("inventory parses");
    (config, accounts)
}

#[test]
fn test_all_configured_environments_generate() {
    let (config, accounts) = load();
    let sets = generate_environment_policies(&config, &accounts).expect("generation succeeds");

    let mut names: Vec<_> = sets.iter().map(|set| set.environment.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["dev", "management", "prod", "stage"]);

    // Foreign accounts never resolve in
    assert!(sets.iter().all(|set| set.account_id != "999999999999"));
    assert!(sets.iter().all(|set| set.account_id != "888888888888"));
}

#[test]
fn test_stage_and_prod_hardened_tiers_are_identical() {
    let (config, accounts) = load();
    let sets = generate_environment_policies(&config, &accounts).expect("generation succeeds");

    let tier_of = |name: &str, account: &str| {
        let set = sets
            .iter()
            .find(|set| set.environment == name)
            .expect("environment generated");
        set.permissions_policy
            .to_json_pretty()
            .expect("serializes")
            .replace(account, "ACCOUNT")
    };

    // Same mode, same region: the capability tier must not drift between
    // staging and production. Only the owning account differs.
    assert_eq!(
        tier_of("stage", "222222222222"),
        tier_of("prod", "333333333333")
    );
}

#[test]
fn test_no_document_grants_iam_writes() {
    let (config, accounts) = load();
    let sets = generate_environment_policies(&config, &accounts).expect("generation succeeds");

    for set in &sets {
        for statement in &set.permissions_policy.statement {
            for action in &statement.action {
                for marker in ["Put", "Create", "Delete", "Attach"] {
                    assert!(
                        !(action.starts_with("iam:") && action.contains(marker)),
                        "environment {} grants {}",
                        set.environment,
                        action
                    );
                }
            }
        }
    }
}

#[test]
fn test_prod_trust_policy_requires_mfa() {
    let (config, accounts) = load();
    let sets = generate_environment_policies(&config, &accounts).expect("generation succeeds");
    let prod = sets
        .iter()
        .find(|set| set.environment == "prod")
        .expect("prod generated");

    let json = serde_json::to_value(&prod.trust_policy).expect("serializes");
    assert_eq!(
        json["Statement"][0]["Condition"]["Bool"]["aws:MultiFactorAuthPresent"][0],
        "true"
    );
    assert_eq!(
        json["Statement"][0]["Condition"]["ArnLike"]["aws:PrincipalArn"][0],
        "arn:aws:iam::333333333333:role/aws-reserved/sso.amazonaws.com/*"
    );
}

#[test]
fn test_trust_patterns_match_generated_sso_principals() {
    let (config, accounts) = load();
    let sets = generate_environment_policies(&config, &accounts).expect("generation succeeds");

    for set in &sets {
        let json = serde_json::to_value(&set.trust_policy).expect("serializes");
        let pattern = json["Statement"][0]["Condition"]["ArnLike"]["aws:PrincipalArn"][0]
            .as_str()
            .expect("pattern is a string")
            .to_string();
        let runtime_principal = pattern.replace('*', "AWSReservedSSO_Admin_abc123");
        assert!(string_like_match(&pattern, &runtime_principal).expect("pattern compiles"));
    }
}

#[test]
fn test_shared_documents_have_allow_and_tls_deny() {
    let (config, accounts) = load();
    let shared = generate_shared_state_policies(&config, &accounts).expect("generation succeeds");

    for document in [&shared.state_bucket_policy, &shared.lock_table_policy] {
        let allows = document
            .statement
            .iter()
            .filter(|s| s.effect == Effect::Allow)
            .count();
        let denies = document
            .statement
            .iter()
            .filter(|s| s.effect == Effect::Deny)
            .count();
        assert_eq!((allows, denies), (1, 1));

        let json = serde_json::to_value(document).expect("serializes");
        assert_eq!(
            json["Statement"][1]["Condition"]["Bool"]["aws:SecureTransport"][0],
            "false"
        );
    }
}

#[test]
fn test_generation_output_is_byte_stable() {
    let (config, accounts) = load();

    let render = || {
        let sets = generate_environment_policies(&config, &accounts).expect("generation succeeds");
        sets.iter()
            .map(|set| {
                format!(
                    "{}{}{}",
                    set.trust_policy.to_json_pretty().expect("serializes"),
                    set.permissions_policy.to_json_pretty().expect("serializes"),
                    set.backend_access_policy
                        .to_json_pretty()
                        .expect("serializes"),
                )
            })
            .collect::<String>()
    };

    assert_eq!(render(), render());
}

#[test]
fn test_out_of_range_session_duration_fails_before_generation() {
    let (mut config, accounts) = load();
    config
        .environments
        .get_mut("dev")
        .expect("dev configured")
        .max_session_duration = Some(43201);

    let err = generate_environment_policies(&config, &accounts).unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("max_session_duration"), "was: {}", rendered);
    assert!(rendered.contains("43200"), "was: {}", rendered);
}
