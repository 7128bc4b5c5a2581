//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{DeliveryPolicy, ServerBlueprint, ThrottlePolicy};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    redis: String,
    queue: String,
    bind: String,
    store_path: String,
    delivery_policy: String,
    rollover: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    redis: blueprint.source.redis_url(),
                    queue: blueprint.source.queue.clone(),
                    bind: blueprint.http.bind.clone(),
                    store_path: blueprint.store.path.clone(),
                    delivery_policy: format!("{:?}", blueprint.hub.delivery_policy),
                    rollover: blueprint
                        .rollover
                        .enabled
                        .then(|| blueprint.rollover.at.clone()),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ServerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.hub.delivery_policy != DeliveryPolicy::Block {
        warnings.push(format!(
            "hub.delivery_policy is {:?} - slow viewers may miss events",
            blueprint.hub.delivery_policy
        ));
    }

    if !blueprint.rollover.enabled {
        warnings.push("rollover is disabled - the daily store grows without bound".to_string());
    }

    if blueprint.ingestion.throttle == ThrottlePolicy::PerItem {
        warnings.push(
            "ingestion.throttle is per_item - at most one event per gate period".to_string(),
        );
    }

    let static_dir = Path::new(&blueprint.http.static_dir);
    if !static_dir.is_dir() {
        warnings.push(format!(
            "http.static_dir '{}' does not exist - static requests will 404",
            blueprint.http.static_dir
        ));
    }

    if !Path::new(&blueprint.store.path).starts_with(static_dir) {
        warnings.push(format!(
            "store.path '{}' is outside http.static_dir - viewers cannot fetch the backlog",
            blueprint.store.path
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Redis: {} ({})", summary.redis, summary.queue);
            println!("  Bind: {}", summary.bind);
            println!("  Store: {}", summary.store_path);
            println!("  Delivery: {}", summary.delivery_policy);
            match summary.rollover {
                Some(ref at) => println!("  Rollover: {}", at),
                None => println!("  Rollover: disabled"),
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
