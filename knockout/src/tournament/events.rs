//! Domain events emitted by the bracket engine.
//!
//! The engine never talks to chat platforms or schedulers directly. Every state
//! change a delivery layer may care about is queued as a [`TournamentEvent`] on the
//! aggregate and drained by the owner after the mutation is committed.

use super::models::{MatchId, ResultReport, TournamentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Events that occur during a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TournamentEvent {
    /// Match moved to in-progress; players need a place to play
    MatchReady {
        match_id: MatchId,
        round: u32,
        player1: UserId,
        player2: UserId,
    },
    MatchCompleted {
        match_id: MatchId,
        round: u32,
        winner: UserId,
        loser: Option<UserId>,
        admin_resolved: bool,
    },
    MatchDisputed {
        match_id: MatchId,
        round: u32,
        reports: Vec<ResultReport>,
    },
    RoundAdvanced {
        round: u32,
        match_ids: Vec<MatchId>,
    },
    TournamentCompleted {
        winner: UserId,
    },
    /// Bracket rebuilt after a reseed; resources tied to `discarded` should be released
    BracketRegenerated {
        shuffle_count: u32,
        discarded: Vec<MatchId>,
    },
}

impl fmt::Display for TournamentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::MatchReady {
                match_id,
                player1,
                player2,
                ..
            } => format!("match {match_id} ready: {player1} vs {player2}"),
            Self::MatchCompleted {
                match_id,
                winner,
                admin_resolved,
                ..
            } => {
                if *admin_resolved {
                    format!("match {match_id} resolved by admin, {winner} advances")
                } else {
                    format!("match {match_id} completed, {winner} advances")
                }
            }
            Self::MatchDisputed {
                match_id, reports, ..
            } => format!("match {match_id} disputed ({} reports)", reports.len()),
            Self::RoundAdvanced { round, match_ids } => {
                format!("round {round} started with {} matches", match_ids.len())
            }
            Self::TournamentCompleted { winner } => format!("{winner} won the tournament"),
            Self::BracketRegenerated {
                shuffle_count,
                discarded,
            } => format!(
                "bracket regenerated (shuffle #{shuffle_count}), {} matches discarded",
                discarded.len()
            ),
        };
        write!(f, "{repr}")
    }
}

/// Event stamped with its origin, ready for delivery
///
/// `id` is stable across delivery retries so sinks can de-duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub tournament_id: TournamentId,
    pub occurred_at: DateTime<Utc>,
    pub event: TournamentEvent,
}

impl EventEnvelope {
    pub fn new(tournament_id: TournamentId, event: TournamentEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            occurred_at: Utc::now(),
            event,
        }
    }
}
