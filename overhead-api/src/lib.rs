//! overhead-api library - historical track read API
//!
//! Read-only HTTP surface over position history. The tracker binary mounts
//! this router in-process; the `overhead-api` binary serves it standalone
//! over an existing database.

use std::sync::Arc;

use axum::Router;
use overhead_common::config::Settings;
use overhead_common::db::PositionStore;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: PositionStore,
    /// Map viewer URL prefix; the `/go/:code` code is appended
    pub map_viewer_url: String,
    /// User-agent substrings refused by `/go/:code`
    pub blocked_user_agents: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(store: PositionStore, map_viewer_url: String, blocked_user_agents: Vec<String>) -> Self {
        Self {
            store,
            map_viewer_url,
            blocked_user_agents: Arc::new(blocked_user_agents),
        }
    }

    pub fn from_settings(store: PositionStore, settings: &Settings) -> Self {
        Self::new(
            store,
            settings.map_viewer_url.clone(),
            settings.blocked_user_agents.clone(),
        )
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(api::root))
        .route("/robots.txt", get(api::robots))
        .route("/go/:code", get(api::go_to_map))
        .route("/tracks", get(api::all_tracks))
        .route("/tracks/:date", get(api::tracks_for_day))
        .route("/index", get(api::date_index))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
