//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::ServerBlueprint;
use tracing::info;

use crate::cli::InfoArgs;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration not found: {}", args.config.display());
    }

    let blueprint = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let json = ConfigLoader::to_json(&blueprint).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print!("{}", render_config_info(&blueprint));
    }

    Ok(())
}

fn render_config_info(blueprint: &ServerBlueprint) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    line("╔══════════════════════════════════════════════════════════════╗".into());
    line("║                  Eventcast Configuration                     ║".into());
    line("╚══════════════════════════════════════════════════════════════╝\n".into());

    let source = &blueprint.source;
    line("📥 Source".into());
    line(format!("   ├─ Version: {:?}", blueprint.version));
    line(format!("   ├─ Redis: {}", source.redis_url()));
    line(format!("   └─ Queue: {}", source.queue));

    let ingestion = &blueprint.ingestion;
    line("\n⏱  Ingestion".into());
    line(format!("   ├─ Gate period: {}ms", ingestion.gate_period_ms));
    line(format!("   ├─ Channel capacity: {}", ingestion.channel_capacity));
    line(format!("   └─ Throttle: {:?}", ingestion.throttle));

    let hub = &blueprint.hub;
    line("\n📡 Hub".into());
    line(format!("   ├─ Delivery policy: {:?}", hub.delivery_policy));
    line(format!("   ├─ Client queue: {}", hub.client_queue_capacity));
    if hub.register_timeout_ms == 0 {
        line("   ├─ Register timeout: none".into());
    } else {
        line(format!("   ├─ Register timeout: {}ms", hub.register_timeout_ms));
    }
    line(format!("   └─ Unregister queue: {}", hub.unregister_capacity));

    let http = &blueprint.http;
    line("\n🌐 HTTP".into());
    line(format!("   ├─ Bind: {}", http.bind));
    line(format!("   ├─ WebSocket: {}", http.ws_path));
    line(format!("   └─ Static files: {}", http.static_dir));

    line("\n💾 Daily store".into());
    line(format!("   ├─ Path: {}", blueprint.store.path));
    line(format!("   ├─ Queue: {}", blueprint.store.queue_capacity));
    if blueprint.rollover.enabled {
        line(format!("   └─ Rollover: daily at {}", blueprint.rollover.at));
    } else {
        line("   └─ Rollover: disabled".into());
    }

    line(format!(
        "\n⏹  Shutdown drain timeout: {}ms",
        blueprint.shutdown.drain_timeout_ms
    ));

    out
}
