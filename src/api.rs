//! Management API: read-only launch list, the rocket family tree and the
//! blocked-family preferences. Stands in for the tray options window.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::catalog::{FamilyTree, RocketCatalog};
use crate::countdown::beautify_seconds;
use crate::launch::CanonicalLaunch;
use crate::metrics::Metrics;
use crate::prefs::PreferenceStore;

fn default_api_enabled() -> bool {
    true
}
fn default_api_addr() -> String {
    "127.0.0.1:8787".to_string()
}

/// `[api]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCfg {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_addr")]
    pub addr: String,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            addr: default_api_addr(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub launches: watch::Receiver<Vec<CanonicalLaunch>>,
    pub prefs: Arc<dyn PreferenceStore>,
    pub catalog: Arc<RocketCatalog>,
    pub metrics: Option<Metrics>,
}

pub fn create_router(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let mut router = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/launches", get(list_launches))
        .route("/rockets", get(rocket_tree))
        .route("/preferences", get(get_preferences).put(put_preferences))
        .with_state(state);

    if let Some(m) = metrics {
        router = router.merge(m.router());
    }
    router.layer(CorsLayer::very_permissive())
}

#[derive(Serialize)]
struct LaunchOut {
    #[serde(flatten)]
    launch: CanonicalLaunch,
    family: Option<String>,
    blocked: bool,
    countdown: String,
}

async fn list_launches(
    State(state): State<AppState>,
) -> Result<Json<Vec<LaunchOut>>, (StatusCode, String)> {
    let blocked = read_blocked(&state)?;
    let now = chrono::Utc::now().timestamp();
    let snapshot = state.launches.borrow().clone();

    let out = snapshot
        .into_iter()
        .map(|l| {
            let family = l.rocket.as_deref().map(|r| state.catalog.family_of(r));
            let countdown = match l.seconds_left(now) {
                Some(s) => beautify_seconds(s),
                None => "Time not yet known".to_string(),
            };
            LaunchOut {
                blocked: state.catalog.is_blocked(l.rocket.as_deref(), &blocked),
                family,
                countdown,
                launch: l,
            }
        })
        .collect();
    Ok(Json(out))
}

async fn rocket_tree(
    State(state): State<AppState>,
) -> Result<Json<FamilyTree>, (StatusCode, String)> {
    let blocked = read_blocked(&state)?;
    Ok(Json(state.catalog.tree(&blocked)))
}

#[derive(Debug, Serialize, Deserialize)]
struct PrefsBody {
    blocked_rockets: BTreeSet<String>,
}

async fn get_preferences(
    State(state): State<AppState>,
) -> Result<Json<PrefsBody>, (StatusCode, String)> {
    Ok(Json(PrefsBody {
        blocked_rockets: read_blocked(&state)?,
    }))
}

async fn put_preferences(
    State(state): State<AppState>,
    Json(body): Json<PrefsBody>,
) -> Result<Json<PrefsBody>, (StatusCode, String)> {
    state
        .prefs
        .set_blocked_families(&body.blocked_rockets)
        .map_err(internal)?;
    get_preferences(State(state)).await
}

fn read_blocked(state: &AppState) -> Result<BTreeSet<String>, (StatusCode, String)> {
    state.prefs.blocked_families().map_err(internal)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    tracing::warn!(error = ?e, "preferences request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
}
