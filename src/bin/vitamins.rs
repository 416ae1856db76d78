use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use vitamins::commands::{default_registry, CommandContext};
use vitamins::core::{Clock, Config, KeyValueStore, SqliteStore, SystemClock};
use vitamins::features::notifications::LocalScheduler;
use vitamins::features::reminders::VitaminCatalog;

fn load_catalog(config: &Config) -> VitaminCatalog {
    let Some(path) = &config.catalog_path else {
        info!("💊 Using the built-in vitamin catalog");
        return VitaminCatalog::builtin();
    };

    match VitaminCatalog::load(path) {
        Ok(catalog) => {
            info!("📄 Loaded {} vitamin(s) from {path}", catalog.len());
            catalog
        }
        Err(e) => {
            if std::path::Path::new(path).exists() {
                error!("❌ Failed to load vitamin catalog from {path}: {e}");
            } else {
                warn!("📄 No vitamin catalog found at {path}");
            }
            info!("💊 Falling back to the built-in vitamin catalog");
            VitaminCatalog::builtin()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting vitamin reminders v{}...", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&config.database_path)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = LocalScheduler::new(clock.clone(), config.auto_grant_permission);
    let catalog = load_catalog(&config);

    let ctx = CommandContext::build(
        config.clone(),
        store,
        Arc::new(engine.clone()),
        clock,
        catalog,
    )
    .await
    .with_local(engine);
    let ctx = Arc::new(ctx);

    // The in-process engine starts empty, so stored plans are scheduled again
    match ctx.reminders.restore().await {
        Ok(count) => info!("📅 {count} reminder plan(s) active"),
        Err(e) => error!("Failed to restore reminder plans: {e:#}"),
    }

    // Start the expiry task
    let reminders = ctx.reminders.clone();
    let period = Duration::from_secs(config.expiry_check_seconds.max(1));
    tokio::spawn(async move {
        reminders.run_expiry_loop(period).await;
    });

    let registry = default_registry();
    info!("Loaded {} commands", registry.len());

    // One-shot mode: run the command given on the command line
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        if let Some(reply) = registry.dispatch(ctx.clone(), &args.join(" ")).await {
            println!("{reply}");
        }
        ctx.sink.flush().await;
        return Ok(());
    }

    if !ctx.disclaimer.has_accepted().await {
        println!("⚕️ Type `disclaimer` to read the medical disclaimer before you start.");
    }
    println!("Type `help` for commands, `quit` to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }
        if let Some(reply) = registry.dispatch(ctx.clone(), trimmed).await {
            println!("{reply}");
        }
    }

    ctx.listeners.lock().await.stop_monitoring();
    ctx.sink.flush().await;
    info!("Goodbye!");
    Ok(())
}
