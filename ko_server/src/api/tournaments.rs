//! Tournament API handlers.
//!
//! Every handler resolves the tournament's actor handle through the manager
//! and forwards the request to it, so mutations are serialized by the actor.
//!
//! # Examples
//!
//! Create a tournament:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Friday Cup", "auto_advance": true}'
//! ```
//!
//! Report a result:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments/1/matches/r1m1/report \
//!   -H "Content-Type: application/json" \
//!   -d '{"reporter_id": 7, "winner_id": 7}'
//! ```

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use knockout::{
    Match, MatchId, ReportOutcome, RoundOutcome, TournamentConfig, TournamentId, UserId,
    host::TournamentHandle,
    tournament::{Standing, TournamentSummary},
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub max_participants: Option<usize>,
    pub min_participants: Option<usize>,
    pub shuffle_on_start: Option<bool>,
    pub auto_start_matches: Option<bool>,
    pub auto_advance: Option<bool>,
}

impl CreateTournamentRequest {
    /// Overlay the requested settings on the server defaults
    pub fn config(&self, defaults: &TournamentConfig) -> TournamentConfig {
        TournamentConfig {
            max_participants: self.max_participants.unwrap_or(defaults.max_participants),
            min_participants: self.min_participants.unwrap_or(defaults.min_participants),
            shuffle_on_start: self.shuffle_on_start.unwrap_or(defaults.shuffle_on_start),
            auto_start_matches: self
                .auto_start_matches
                .unwrap_or(defaults.auto_start_matches),
            auto_advance: self.auto_advance.unwrap_or(defaults.auto_advance),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
    pub seed: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Explicit seeding order; registrations are used when absent
    pub participants: Option<Vec<UserId>>,
}

#[derive(Debug, Deserialize)]
pub struct MatchFilter {
    pub round: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub reporter_id: UserId,
    pub winner_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub winner_id: UserId,
    pub resolver_id: UserId,
}

async fn handle(state: &AppState, id: TournamentId) -> ApiResult<TournamentHandle> {
    Ok(state.manager.get_tournament(id).await?)
}

/// Create a tournament from the server defaults and the request overrides.
///
/// Returns `201 Created` with the new tournament's summary.
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<TournamentSummary>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Tournament name is required".to_string()));
    }

    let config = request.config(&state.defaults);
    let id = state.manager.create_tournament(name, config).await?;
    let summary = handle(&state, id).await?.summary().await?;

    tracing::info!(tournament_id = id, name = %summary.name, "Tournament created");
    Ok((StatusCode::CREATED, Json(summary)))
}

/// List summaries of all running tournaments, ordered by ID.
pub async fn list_tournaments(State(state): State<AppState>) -> Json<Vec<TournamentSummary>> {
    Json(state.manager.list_tournaments().await)
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<TournamentSummary>> {
    Ok(Json(handle(&state, id).await?.summary().await?))
}

/// Stop a tournament's actor. The stored state is kept.
pub async fn close_tournament(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<StatusCode> {
    state.manager.close_tournament(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_standings(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<Vec<Standing>>> {
    Ok(Json(handle(&state, id).await?.standings().await?))
}

pub async fn register_participant(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let seed = handle(&state, id).await?.register(request.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: request.user_id,
            seed,
        }),
    ))
}

pub async fn withdraw_participant(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(TournamentId, UserId)>,
) -> ApiResult<StatusCode> {
    handle(&state, id).await?.withdraw(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build round 1 and move the tournament to ongoing.
///
/// With a `participants` list the bracket is created from that exact field;
/// an empty body starts from the current registrations.
pub async fn start_tournament(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    body: Bytes,
) -> ApiResult<Json<Vec<Match>>> {
    let request: StartRequest = if body.is_empty() {
        StartRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid start request: {e}")))?
    };

    let tournament = handle(&state, id).await?;
    let round1 = match request.participants {
        Some(participants) => tournament.create_bracket(participants).await?,
        None => tournament.start().await?,
    };
    Ok(Json(round1))
}

pub async fn reseed_tournament(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<Vec<Match>>> {
    Ok(Json(handle(&state, id).await?.reseed().await?))
}

pub async fn advance_round(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<RoundOutcome>> {
    Ok(Json(handle(&state, id).await?.advance_round().await?))
}

/// List matches ordered by round and position, optionally for one round.
pub async fn list_matches(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Query(filter): Query<MatchFilter>,
) -> ApiResult<Json<Vec<Match>>> {
    Ok(Json(handle(&state, id).await?.matches(filter.round).await?))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path((id, match_id)): Path<(TournamentId, MatchId)>,
) -> ApiResult<Json<Match>> {
    Ok(Json(handle(&state, id).await?.get_match(match_id).await?))
}

pub async fn start_match(
    State(state): State<AppState>,
    Path((id, match_id)): Path<(TournamentId, MatchId)>,
) -> ApiResult<Json<Match>> {
    Ok(Json(handle(&state, id).await?.start_match(match_id).await?))
}

/// Record a participant's self-report.
///
/// Answers `200 OK` while awaiting confirmation or once finalized, and
/// `409 Conflict` with the disputed reports when the two sides disagree.
pub async fn report_result(
    State(state): State<AppState>,
    Path((id, match_id)): Path<(TournamentId, MatchId)>,
    Json(request): Json<ReportRequest>,
) -> ApiResult<Response> {
    let outcome = handle(&state, id)
        .await?
        .report_result(match_id.clone(), request.reporter_id, request.winner_id)
        .await?;

    let status = match outcome {
        ReportOutcome::Disputed { .. } => {
            tracing::warn!(tournament_id = id, match_id = %match_id, "Match disputed");
            StatusCode::CONFLICT
        }
        _ => StatusCode::OK,
    };
    Ok((status, Json(outcome)).into_response())
}

/// Admin override: finalize a match with the given winner.
pub async fn resolve_dispute(
    State(state): State<AppState>,
    Path((id, match_id)): Path<(TournamentId, MatchId)>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Json<Match>> {
    let resolved = handle(&state, id)
        .await?
        .resolve_dispute(match_id, request.winner_id, request.resolver_id)
        .await?;
    Ok(Json(resolved))
}
