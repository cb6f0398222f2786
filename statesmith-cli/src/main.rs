//! statesmith command-line interface
//!
//! Loads an organization account inventory and a per-environment
//! configuration from JSON, validates them, and emits the trust, resource,
//! and execution-role policy documents the provisioning layer attaches.
//!
//! Exit codes: 0 on success, 2 on configuration validation failure, 1 on
//! anything else (including a non-matching principal check).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use statesmith_policy_generation::{
    generate_environment_policies, generate_shared_state_policies, resolve_environment_accounts,
    string_like_match, OrgAccount, OrgConfig, PolicyError,
};

#[derive(Parser)]
#[command(
    name = "statesmith",
    version,
    about = "Generates IAM trust, resource, and execution-role policy documents for multi-account Terraform remote-state backends"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate policy documents for every environment that resolves to an
    /// account
    Generate {
        /// Path to the project configuration (JSON)
        #[arg(long)]
        config: PathBuf,
        /// Path to the organization account inventory (JSON)
        #[arg(long)]
        accounts: PathBuf,
        /// Directory to write documents into; prints to stdout if omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration without generating anything
    Validate {
        /// Path to the project configuration (JSON)
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the environment-to-account mapping the inventory resolves to
    ResolveAccounts {
        /// Path to the project configuration (JSON)
        #[arg(long)]
        config: PathBuf,
        /// Path to the organization account inventory (JSON)
        #[arg(long)]
        accounts: PathBuf,
    },
    /// Check a runtime principal ARN against a string-like pattern
    MatchPrincipal {
        /// Pattern, may contain `*`/`?` wildcards
        #[arg(long)]
        pattern: String,
        /// Principal ARN observed at runtime
        #[arg(long)]
        principal: String,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            if matches!(
                err.downcast_ref::<PolicyError>(),
                Some(PolicyError::ConfigurationValidation { .. })
            ) {
                eprintln!("Configuration invalid: {err:#}");
                ExitCode::from(2)
            } else {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Generate {
            config,
            accounts,
            output,
        } => generate(&config, &accounts, output.as_deref()),
        Command::Validate { config } => validate(&config),
        Command::ResolveAccounts { config, accounts } => resolve(&config, &accounts),
        Command::MatchPrincipal { pattern, principal } => match_principal(&pattern, &principal),
        Command::Schema => schema(),
    }
}

fn load_config(path: &Path) -> anyhow::Result<OrgConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse configuration {}", path.display()))
}

fn load_accounts(path: &Path) -> anyhow::Result<Vec<OrgAccount>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read account inventory {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse account inventory {}", path.display()))
}

fn generate(
    config_path: &Path,
    accounts_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;
    let accounts = load_accounts(accounts_path)?;

    let sets = generate_environment_policies(&config, &accounts)?;
    let shared = generate_shared_state_policies(&config, &accounts)?;

    match output {
        Some(directory) => {
            for set in &sets {
                let env_dir = directory.join(&set.environment);
                fs::create_dir_all(&env_dir)
                    .with_context(|| format!("Failed to create {}", env_dir.display()))?;
                write_document(&env_dir.join("trust-policy.json"), &set.trust_policy)?;
                write_document(
                    &env_dir.join("permissions-policy.json"),
                    &set.permissions_policy,
                )?;
                write_document(
                    &env_dir.join("backend-access-policy.json"),
                    &set.backend_access_policy,
                )?;
                info!(
                    "Wrote documents for environment {} (account {})",
                    set.environment, set.account_id
                );
            }

            let shared_dir = directory.join("shared");
            fs::create_dir_all(&shared_dir)
                .with_context(|| format!("Failed to create {}", shared_dir.display()))?;
            write_document(
                &shared_dir.join("state-bucket-policy.json"),
                &shared.state_bucket_policy,
            )?;
            write_document(
                &shared_dir.join("lock-table-policy.json"),
                &shared.lock_table_policy,
            )?;

            println!(
                "Generated documents for {} environment(s) under {}",
                sets.len(),
                directory.display()
            );
        }
        None => {
            let mut environments = serde_json::Map::new();
            for set in &sets {
                environments.insert(
                    set.environment.clone(),
                    serde_json::json!({
                        "account_id": set.account_id,
                        "trust_policy": set.trust_policy,
                        "permissions_policy": set.permissions_policy,
                        "backend_access_policy": set.backend_access_policy,
                    }),
                );
            }
            let combined = serde_json::json!({
                "environments": environments,
                "shared": {
                    "state_bucket_policy": shared.state_bucket_policy,
                    "lock_table_policy": shared.lock_table_policy,
                },
            });
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn validate(config_path: &Path) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;
    config.validate()?;
    println!(
        "Configuration valid: {} environment(s) configured",
        config.environments.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn resolve(config_path: &Path, accounts_path: &Path) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;
    let accounts = load_accounts(accounts_path)?;
    config.validate()?;

    let resolved = resolve_environment_accounts(
        &accounts,
        &config.project,
        &config.recognized_environments(),
    );
    for environment in config.environments.keys() {
        if !resolved.contains_key(environment) {
            eprintln!(
                "Warning: no account named {}{} in the inventory; environment {} will be skipped",
                config.project, environment, environment
            );
        }
    }
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(ExitCode::SUCCESS)
}

fn match_principal(pattern: &str, principal: &str) -> anyhow::Result<ExitCode> {
    if string_like_match(pattern, principal)? {
        println!("match");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("no match");
        Ok(ExitCode::FAILURE)
    }
}

fn schema() -> anyhow::Result<ExitCode> {
    let schema = schemars::schema_for!(OrgConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(ExitCode::SUCCESS)
}

fn write_document(
    path: &Path,
    document: &statesmith_policy_generation::PolicyDocument,
) -> anyhow::Result<()> {
    let json = document.to_json_pretty()?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
