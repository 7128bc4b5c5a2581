//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::ServerBlueprint;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_server(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides, then re-check the result
    apply_overrides(&mut blueprint, args);
    ConfigLoader::validate(&blueprint).context("Invalid configuration after CLI overrides")?;

    info!(
        redis = %blueprint.source.redis_url(),
        queue = %blueprint.source.queue,
        bind = %blueprint.http.bind,
        store = %blueprint.store.path,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    info!("Starting server...");

    let stats = pipeline
        .run(setup_shutdown_signal())
        .await
        .context("Server execution failed")?;

    info!(
        items = stats.hub.items_broadcast,
        duration_secs = stats.duration.as_secs_f64(),
        items_per_sec = format!("{:.2}", stats.items_per_sec()),
        "Server stopped"
    );
    stats.print_summary();

    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
pub(crate) fn apply_overrides(blueprint: &mut ServerBlueprint, args: &RunArgs) {
    if let Some(ref bind) = args.bind {
        info!(bind = %bind, "Overriding HTTP bind address from CLI");
        blueprint.http.bind = bind.clone();
    }
    if let Some(ref queue) = args.queue {
        info!(queue = %queue, "Overriding Redis queue from CLI");
        blueprint.source.queue = queue.clone();
    }
    if let Some(ref host) = args.redis_host {
        info!(host = %host, "Overriding Redis host from CLI");
        blueprint.source.redis_host = host.clone();
    }
    if let Some(port) = args.redis_port {
        info!(port = port, "Overriding Redis port from CLI");
        blueprint.source.redis_port = port;
    }
    if let Some(ref path) = args.store_path {
        info!(path = %path, "Overriding daily store path from CLI");
        blueprint.store.path = path.clone();
    }
}

/// Resolve on Ctrl+C or SIGTERM
///
/// If a handler cannot be installed the error is logged and that signal
/// is never observed.
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &ServerBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source:");
    println!("  Redis: {}", blueprint.source.redis_url());
    println!("  Queue: {}", blueprint.source.queue);
    println!(
        "  Gate: every {}ms ({:?})",
        blueprint.ingestion.gate_period_ms, blueprint.ingestion.throttle
    );

    println!("\nHTTP:");
    println!("  Bind: {}", blueprint.http.bind);
    println!("  WebSocket: {}", blueprint.http.ws_path);
    println!("  Static files: {}", blueprint.http.static_dir);

    println!("\nHub:");
    println!("  Delivery policy: {:?}", blueprint.hub.delivery_policy);
    println!("  Client queue: {}", blueprint.hub.client_queue_capacity);

    println!("\nDaily store:");
    println!("  Path: {}", blueprint.store.path);
    if blueprint.rollover.enabled {
        println!("  Rollover: daily at {}", blueprint.rollover.at);
    } else {
        println!("  Rollover: disabled");
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_apply_overrides() {
        let mut bp = ServerBlueprint::default();
        bp.source.queue = "events".to_string();

        let args = RunArgs {
            bind: Some("0.0.0.0:8080".to_string()),
            queue: Some("analyzer:3:x".to_string()),
            redis_host: Some("redis.internal".to_string()),
            redis_port: Some(6380),
            store_path: Some("/tmp/daily.json".to_string()),
            ..Default::default()
        };
        apply_overrides(&mut bp, &args);

        assert_eq!(bp.http.bind, "0.0.0.0:8080");
        assert_eq!(bp.source.queue, "analyzer:3:x");
        assert_eq!(bp.source.redis_host, "redis.internal");
        assert_eq!(bp.source.redis_port, 6380);
        assert_eq!(bp.store.path, "/tmp/daily.json");
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut bp = ServerBlueprint::default();
        bp.source.queue = "events".to_string();
        apply_overrides(&mut bp, &RunArgs::default());

        assert_eq!(bp.source.queue, "events");
        assert_eq!(bp.http.bind, "127.0.0.1:1323");
    }

    #[tokio::test]
    async fn test_dry_run_does_not_connect() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eventcast.toml");
        std::fs::write(&path, "[source]\nqueue = \"events\"\n").unwrap();

        let args = RunArgs {
            config: path,
            // Nothing listens here; a real run would fail to connect
            redis_port: Some(1),
            dry_run: true,
            ..Default::default()
        };
        assert!(run_server(&args).await.is_ok());
    }

    #[tokio::test]
    async fn test_override_is_validated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eventcast.toml");
        std::fs::write(&path, "[source]\nqueue = \"events\"\n").unwrap();

        let args = RunArgs {
            config: path,
            queue: Some(String::new()),
            dry_run: true,
            ..Default::default()
        };
        let err = run_server(&args).await.unwrap_err();
        assert!(format!("{err:#}").contains("source.queue"), "got: {err:#}");
    }

    #[tokio::test]
    async fn test_missing_config() {
        let args = RunArgs {
            config: "/nonexistent/eventcast.toml".into(),
            ..Default::default()
        };
        let err = run_server(&args).await.unwrap_err().to_string();
        assert!(err.contains("Configuration not found"), "got: {err}");
    }
}
