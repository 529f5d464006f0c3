//! Historical tracks and date index

use axum::{
    extract::{Path, State},
    Json,
};
use overhead_common::models::{AircraftMetadata, DateRange, GroupedTracks};
use overhead_common::time::{day_bounds, parse_day, EARLIEST_TIMESTAMP, LATEST_TIMESTAMP};
use serde::Serialize;

use crate::{ApiResult, AppState};

/// Grouped positions plus metadata for every aircraft in them
#[derive(Debug, Serialize)]
pub struct TracksResponse {
    pub tracks: GroupedTracks,
    pub aircraft: Vec<AircraftMetadata>,
}

async fn tracks_between(state: &AppState, start: &str, end: &str) -> ApiResult<TracksResponse> {
    let tracks = state.store.query_by_date_range(start, end).await?;
    let aircraft = state.store.query_aircraft_by_date_range(start, end).await?;
    Ok(TracksResponse { tracks, aircraft })
}

/// GET /tracks
pub async fn all_tracks(State(state): State<AppState>) -> ApiResult<Json<TracksResponse>> {
    Ok(Json(
        tracks_between(&state, EARLIEST_TIMESTAMP, LATEST_TIMESTAMP).await?,
    ))
}

/// GET /tracks/:date
///
/// `date` must be `yyyy-mm-dd`; the range is that local day, 00:00:00 to
/// 23:59:59 inclusive. Malformed dates are rejected before the store is
/// touched.
pub async fn tracks_for_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Json<TracksResponse>> {
    let day = parse_day(&date)?;
    let (start, end) = day_bounds(day);
    Ok(Json(tracks_between(&state, &start, &end).await?))
}

/// GET /index
pub async fn date_index(State(state): State<AppState>) -> ApiResult<Json<DateRange>> {
    Ok(Json(state.store.available_date_range().await?))
}
