//! Launch alert daemon: polls launch sites, reconciles them and notifies
//! ahead of every liftoff. Runs until killed.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use launch_alert::api::{create_router, AppState};
use launch_alert::catalog::RocketCatalog;
use launch_alert::config::AppConfig;
use launch_alert::ingest::providers::build_adapters;
use launch_alert::metrics::Metrics;
use launch_alert::notify::PresenterMux;
use launch_alert::prefs::{FilePreferenceStore, PreferenceStore};
use launch_alert::scheduler::Scheduler;

/// Compact logs by default, JSON when LAUNCH_ALERT_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("launch_alert=info,warn"));

    let json = std::env::var("LAUNCH_ALERT_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = match AppConfig::load_default() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "cannot load configuration");
            return Err(e);
        }
    };

    let metrics = match Metrics::init(cfg.scheduler.max_repoll_secs) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics disabled");
            None
        }
    };

    // The only fatal step: nowhere to show notifications.
    let presenters = match PresenterMux::from_config(&cfg.notify) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = ?e, "cannot initialise notifications");
            return Err(e.context("notification init"));
        }
    };

    let prefs: Arc<dyn PreferenceStore> = Arc::new(FilePreferenceStore::new(&cfg.prefs.path));
    let catalog = Arc::new(RocketCatalog::load_from_file(&cfg.prefs.catalog_path));

    let adapters = build_adapters(&cfg.sources)?;
    if adapters.is_empty() {
        tracing::warn!("no launch sources enabled; only periodic re-polls will happen");
    }

    let (tx, rx) = watch::channel(Vec::new());

    if cfg.api.enabled {
        let state = AppState {
            launches: rx,
            prefs: prefs.clone(),
            catalog: catalog.clone(),
            metrics,
        };
        let listener = tokio::net::TcpListener::bind(&cfg.api.addr)
            .await
            .with_context(|| format!("binding management api on {}", cfg.api.addr))?;
        tracing::info!(addr = %cfg.api.addr, "management api listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, create_router(state)).await {
                tracing::warn!(error = ?e, "management api stopped");
            }
        });
    }

    let mut scheduler = Scheduler::new(
        adapters,
        cfg.reconcile.clone(),
        cfg.scheduler.clone(),
        presenters,
        prefs,
        catalog,
    )
    .with_publisher(tx);

    scheduler.run().await;
    Ok(())
}
