// src/lib.rs
// Public library surface for the daemon, the demo binary and integration tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod countdown;
pub mod ingest;
pub mod launch;
pub mod metrics;
pub mod notify;
pub mod prefs;
pub mod reconcile;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::AppConfig;
pub use crate::launch::{CanonicalLaunch, LaunchRecord, LaunchTime, SourceBatch, SourceReport};
pub use crate::notify::{Action, Notification, Presenter, PresenterMux};
pub use crate::reconcile::{reconcile, reconcile_next, ReconcileCfg};
pub use crate::scheduler::{Scheduler, SchedulerCfg};
