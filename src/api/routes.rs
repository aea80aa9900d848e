use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::{
    adp_drift, core_roster_counts, draft_slot_correlation, find_stacks, first_pick_stats, heat_map,
    player_details, position_round_counts, position_stats, roster_construction, team_roster_constructions,
    CoreRosterCount, DraftSlotQuery, DraftSlotRow, DriftEntry, FirstPickStats, HeatMapCell, PlayerDetails,
    PlayerPage, PlayerQuery, PositionStats, RosterConstruction, RoundCount, StackEntry, TeamRosterConstruction,
};
use crate::api::health::HealthState;
use crate::api::latency::{LatencySnapshot, LatencyStats};
use crate::combinations::{unique_rosters_with_stats, CombinationStats, TeamCombinationResult};
use crate::config::{QueryBackend, DEFAULT_LIMIT, DEFAULT_STACK_ROUNDS, MAX_LIMIT};
use crate::db::{backend, SqlEngine};
use crate::error::AppError;
use crate::state::{Dataset, DatasetMetadata};
use crate::types::{Aggregation, CorrelationMetric, Position, RoundWindow, SortColumn, SortOrder};

#[derive(Clone)]
pub struct ApiState {
    pub dataset: Arc<Dataset>,
    /// Present when the SQL mirror was built at startup.
    pub sql: Option<SqlEngine>,
    pub backend: QueryBackend,
    pub latency: Arc<LatencyStats>,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/metadata", get(get_metadata))
        .route("/players", get(get_players))
        .route("/players/details", get(get_player_details))
        .route("/combinations", get(get_combinations))
        .route("/positions/stats", get(get_position_stats))
        .route("/positions/first-pick", get(get_first_pick_stats))
        .route("/positions/:position/by-round", get(get_position_by_round))
        .route("/roster-construction", get(get_roster_construction))
        .route("/roster-construction/teams", get(get_team_constructions))
        .route("/roster-construction/core", get(get_core_constructions))
        .route("/analytics/draft-slot", get(get_draft_slot))
        .route("/analytics/drift", get(get_drift))
        .route("/analytics/stacks", get(get_stacks))
        .route("/analytics/heat-map", get(get_heat_map))
        .route("/stats/latency", get(get_stats_latency))
        .layer(middleware::from_fn_with_state(state.clone(), track_request))
        .with_state(state)
}

/// Times every request and counts failures.
async fn track_request(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed();

    let status = response.status();
    state.latency.record(elapsed);
    state.health.record(status.is_client_error() || status.is_server_error());
    debug!(path = %path, status = status.as_u16(), elapsed_us = elapsed.as_micros() as u64, "Request");
    response
}

// ---------------------------------------------------------------------------
// Query param parsing
// ---------------------------------------------------------------------------

/// Parse an optional query parameter; unknown values are `InvalidParameter`.
fn parse_opt<T: FromStr<Err = AppError>>(value: Option<&str>) -> Result<Option<T>, AppError> {
    value.map(str::parse).transpose()
}

/// Comma-separated list, blanks dropped.
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn check_limit(limit: usize) -> Result<usize, AppError> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::InvalidParameter(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {limit}"
        )));
    }
    Ok(limit)
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayersParams {
    /// e.g. `QB,WR`
    pub positions: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl PlayersParams {
    fn into_query(self) -> Result<PlayerQuery, AppError> {
        let positions = split_list(self.positions.as_deref())
            .iter()
            .map(|p| p.parse::<Position>())
            .collect::<Result<Vec<_>, _>>()?;
        let defaults = PlayerQuery::default();
        Ok(PlayerQuery {
            positions,
            search_term: self.search,
            sort_by: parse_opt::<SortColumn>(self.sort_by.as_deref())?.unwrap_or(defaults.sort_by),
            sort_order: parse_opt::<SortOrder>(self.sort_order.as_deref())?.unwrap_or(defaults.sort_order),
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayerDetailsParams {
    pub name: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CombinationsParams {
    pub n_rounds: Option<u32>,
    /// Comma-separated player names.
    pub required_players: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ByRoundParams {
    pub aggregation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DraftSlotParams {
    pub slot: Option<u32>,
    pub metric: Option<String>,
    pub top_n: Option<usize>,
    pub min_teams: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DriftParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StacksParams {
    pub n_rounds: Option<u32>,
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub rows: usize,
    pub query_backend: String,
    pub sql_mirror: bool,
    pub uptime_secs: u64,
    pub requests_served: u64,
    pub requests_failed: u64,
}

#[derive(Serialize)]
pub struct CombinationsResponse {
    pub results: Vec<TeamCombinationResult>,
    pub stats: CombinationStats,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rows: state.dataset.len(),
        query_backend: state.backend.to_string(),
        sql_mirror: state.sql.is_some(),
        uptime_secs: state.health.uptime_secs(),
        requests_served: state.health.requests_served(),
        requests_failed: state.health.requests_failed(),
    })
}

async fn get_metadata(State(state): State<ApiState>) -> Json<DatasetMetadata> {
    Json(state.dataset.metadata().clone())
}

async fn get_players(
    State(state): State<ApiState>,
    Query(params): Query<PlayersParams>,
) -> Result<Json<PlayerPage>, AppError> {
    let query = params.into_query()?;
    let page = backend::players(state.backend, &state.dataset, state.sql.as_ref(), &query).await?;
    Ok(Json(page))
}

async fn get_player_details(
    State(state): State<ApiState>,
    Query(params): Query<PlayerDetailsParams>,
) -> Result<Json<PlayerDetails>, AppError> {
    let (Some(name), Some(position), Some(team)) = (params.name, params.position, params.team) else {
        return Err(AppError::InvalidParameter(
            "name, position and team are required".to_string(),
        ));
    };
    let position = position.parse::<Position>()?;
    Ok(Json(player_details(&state.dataset, &name, position, &team)?))
}

async fn get_combinations(
    State(state): State<ApiState>,
    Query(params): Query<CombinationsParams>,
) -> Result<Json<CombinationsResponse>, AppError> {
    let window = RoundWindow::from_param(params.n_rounds)?;
    let required = split_list(params.required_players.as_deref());
    let limit = params.limit.map(check_limit).transpose()?;

    let (results, stats) = unique_rosters_with_stats(&state.dataset, window, &required, limit);
    Ok(Json(CombinationsResponse { results, stats }))
}

async fn get_position_stats(State(state): State<ApiState>) -> Json<Vec<PositionStats>> {
    Json(position_stats(&state.dataset))
}

async fn get_first_pick_stats(State(state): State<ApiState>) -> Json<Vec<FirstPickStats>> {
    Json(first_pick_stats(&state.dataset))
}

async fn get_position_by_round(
    State(state): State<ApiState>,
    Path(position): Path<String>,
    Query(params): Query<ByRoundParams>,
) -> Result<Json<Vec<RoundCount>>, AppError> {
    let position = position.parse::<Position>()?;
    let aggregation = parse_opt::<Aggregation>(params.aggregation.as_deref())?.unwrap_or(Aggregation::Mean);
    Ok(Json(position_round_counts(&state.dataset, position, aggregation)))
}

async fn get_roster_construction(State(state): State<ApiState>) -> Json<Vec<RosterConstruction>> {
    Json(roster_construction(&state.dataset))
}

async fn get_team_constructions(State(state): State<ApiState>) -> Json<Vec<TeamRosterConstruction>> {
    Json(team_roster_constructions(&state.dataset))
}

async fn get_core_constructions(State(state): State<ApiState>) -> Json<Vec<CoreRosterCount>> {
    Json(core_roster_counts(&state.dataset))
}

async fn get_draft_slot(
    State(state): State<ApiState>,
    Query(params): Query<DraftSlotParams>,
) -> Result<Json<Vec<DraftSlotRow>>, AppError> {
    let Some(slot) = params.slot else {
        return Err(AppError::InvalidParameter("slot is required".to_string()));
    };
    let metric = parse_opt::<CorrelationMetric>(params.metric.as_deref())?.unwrap_or(CorrelationMetric::Percent);
    let defaults = DraftSlotQuery::new(slot, metric);
    let query = DraftSlotQuery {
        top_n: params.top_n.unwrap_or(defaults.top_n),
        min_teams: params.min_teams.unwrap_or(defaults.min_teams),
        ..defaults
    };
    Ok(Json(draft_slot_correlation(&state.dataset, &query)?))
}

async fn get_drift(
    State(state): State<ApiState>,
    Query(params): Query<DriftParams>,
) -> Result<Json<Vec<DriftEntry>>, AppError> {
    let limit = check_limit(params.limit.unwrap_or(DEFAULT_LIMIT))?;
    let mut drift = adp_drift(&state.dataset);
    drift.truncate(limit);
    Ok(Json(drift))
}

async fn get_stacks(
    State(state): State<ApiState>,
    Query(params): Query<StacksParams>,
) -> Result<Json<Vec<StackEntry>>, AppError> {
    let window = RoundWindow::from_param(Some(params.n_rounds.unwrap_or(DEFAULT_STACK_ROUNDS)))?;
    let stacks = find_stacks(&state.dataset, window, params.limit.unwrap_or(DEFAULT_LIMIT))?;
    Ok(Json(stacks))
}

async fn get_heat_map(State(state): State<ApiState>) -> Json<Vec<HeatMapCell>> {
    Json(heat_map(&state.dataset))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySnapshot> {
    Json(state.latency.snapshot())
}
