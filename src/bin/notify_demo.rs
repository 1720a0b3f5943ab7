//! Demo that reconciles the bundled fixture pages and walks the first launch
//! through every threshold alert (stdout only unless webhooks are configured).

use launch_alert::config::AppConfig;
use launch_alert::countdown::THRESHOLDS;
use launch_alert::ingest::fetch_all;
use launch_alert::ingest::providers::{
    next_spaceflight::NextSpaceflight, rocketlaunch_live::RocketLaunchLive,
};
use launch_alert::ingest::types::SiteAdapter;
use launch_alert::notify::{Notification, PresenterMux};
use launch_alert::reconcile::reconcile;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = AppConfig::load_default()?;
    let mux = PresenterMux::from_config(&cfg.notify)?;

    let adapters: Vec<Box<dyn SiteAdapter>> = vec![
        Box::new(RocketLaunchLive::from_fixture(include_str!(
            "../../tests/fixtures/rocketlaunch_live.html"
        ))),
        Box::new(NextSpaceflight::from_fixture(include_str!(
            "../../tests/fixtures/next_spaceflight.html"
        ))),
    ];
    let batch = fetch_all(&adapters).await;
    let launches = reconcile(&batch, &cfg.reconcile);

    let Some(first) = launches.first() else {
        println!("notify-demo: fixtures produced no launches");
        return Ok(());
    };

    for thr in THRESHOLDS.iter().rev() {
        mux.present(&Notification::for_launch(first, thr.label)).await;
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    }

    println!("notify-demo done ({} launches reconciled)", launches.len());
    Ok(())
}
