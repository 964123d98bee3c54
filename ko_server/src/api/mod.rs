//! HTTP API for the tournament server.
//!
//! # Modules
//!
//! - [`tournaments`]: Tournament, participant and match handlers
//! - [`middleware`]: Admin-token gate for organizer endpoints
//! - [`request_id`]: Request ID propagation
//! - [`error`]: Engine error to HTTP status mapping
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health
//! POST   /api/v1/tournaments
//! GET    /api/v1/tournaments
//! GET    /api/v1/tournaments/{id}
//! DELETE /api/v1/tournaments/{id}                                  (admin)
//! GET    /api/v1/tournaments/{id}/standings
//! POST   /api/v1/tournaments/{id}/participants
//! DELETE /api/v1/tournaments/{id}/participants/{user_id}
//! POST   /api/v1/tournaments/{id}/start                            (admin)
//! POST   /api/v1/tournaments/{id}/reseed                           (admin)
//! POST   /api/v1/tournaments/{id}/advance                          (admin)
//! GET    /api/v1/tournaments/{id}/matches?round=
//! GET    /api/v1/tournaments/{id}/matches/{match_id}
//! POST   /api/v1/tournaments/{id}/matches/{match_id}/start         (admin)
//! POST   /api/v1/tournaments/{id}/matches/{match_id}/report
//! POST   /api/v1/tournaments/{id}/matches/{match_id}/resolve       (admin)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use knockout::{TournamentConfig, host::TournamentManager, store::MemoryStore};
//! use ko_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     manager: Arc::new(TournamentManager::new(Arc::new(MemoryStore::new()), None)),
//!     defaults: TournamentConfig::default(),
//!     admin_token: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod error;
pub mod middleware;
pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    handler::Handler,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use knockout::{TournamentConfig, host::TournamentManager};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Spawns tournament actors and hands out their handles
    pub manager: Arc<TournamentManager>,
    /// Settings applied to new tournaments unless the request overrides them
    pub defaults: TournamentConfig,
    /// Bearer token guarding organizer routes, open when `None`
    pub admin_token: Option<Arc<str>>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route(
            "/tournaments",
            post(tournaments::create_tournament).get(tournaments::list_tournaments),
        )
        .route(
            "/tournaments/{id}",
            get(tournaments::get_tournament).delete(
                tournaments::close_tournament.layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::admin_middleware,
                )),
            ),
        )
        .route("/tournaments/{id}/standings", get(tournaments::get_standings))
        .route(
            "/tournaments/{id}/participants",
            post(tournaments::register_participant),
        )
        .route(
            "/tournaments/{id}/participants/{user_id}",
            delete(tournaments::withdraw_participant),
        )
        .route("/tournaments/{id}/matches", get(tournaments::list_matches))
        .route(
            "/tournaments/{id}/matches/{match_id}",
            get(tournaments::get_match),
        )
        .route(
            "/tournaments/{id}/matches/{match_id}/report",
            post(tournaments::report_result),
        );

    let admin_routes = Router::new()
        .route("/tournaments/{id}/start", post(tournaments::start_tournament))
        .route("/tournaments/{id}/reseed", post(tournaments::reseed_tournament))
        .route("/tournaments/{id}/advance", post(tournaments::advance_round))
        .route(
            "/tournaments/{id}/matches/{match_id}/start",
            post(tournaments::start_match),
        )
        .route(
            "/tournaments/{id}/matches/{match_id}/resolve",
            post(tournaments::resolve_dispute),
        )
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::admin_middleware,
        ));

    Router::new().merge(public_routes).merge(admin_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","tournaments":2,"timestamp":"2026-10-17T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let tournaments = state.manager.tournament_count().await;

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tournaments": tournaments,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
