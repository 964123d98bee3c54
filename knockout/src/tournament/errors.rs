//! Tournament error types.

use super::models::{MatchId, MatchStatus, TournamentId, TournamentStatus, UserId};
use serde::Serialize;
use thiserror::Error;

/// Coarse error classification used by callers to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input (unknown match, non-participant winner, malformed data)
    Validation,
    /// Action not valid for the current status
    State,
    /// Concurrent modification detected
    Conflict,
    /// Missing tournament
    NotFound,
    /// Actor or serialization failure
    Unavailable,
}

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Participant not found: {0}")]
    ParticipantNotFound(UserId),

    #[error("User {user_id} is not playing in match {match_id}")]
    NotAMatchParticipant { match_id: MatchId, user_id: UserId },

    #[error("Claimed winner {winner_id} is not playing in match {match_id}")]
    InvalidWinner { match_id: MatchId, winner_id: UserId },

    #[error("Malformed scores on match {match_id}: {player1}-{player2}")]
    MalformedScores {
        match_id: MatchId,
        player1: u8,
        player2: u8,
    },

    #[error("Participant already registered: {0}")]
    DuplicateParticipant(UserId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Corrupt tournament state: {0}")]
    CorruptState(String),

    #[error("Match {match_id} is not in progress (status: {status})")]
    MatchNotInProgress {
        match_id: MatchId,
        status: MatchStatus,
    },

    #[error("Match {0} is already completed")]
    MatchAlreadyCompleted(MatchId),

    #[error("Match {0} is still waiting for players")]
    MatchNotReady(MatchId),

    #[error("Round {round} is not complete: {pending} match(es) still open")]
    RoundIncomplete { round: u32, pending: usize },

    #[error("Reseeding not allowed: {0}")]
    ReseedNotAllowed(String),

    #[error("Tournament not in correct state: expected {expected}, got {actual}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("Insufficient participants: need {needed}, have {current}")]
    NotEnoughParticipants { needed: usize, current: usize },

    #[error("Tournament is full ({0} participants)")]
    TournamentFull(usize),

    #[error("Invalid transition for match {match_id}: {from} -> {to}")]
    InvalidTransition {
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    },

    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Tournament {0} is not accepting requests")]
    ActorUnavailable(TournamentId),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TournamentError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::MatchNotFound(_)
            | TournamentError::ParticipantNotFound(_)
            | TournamentError::NotAMatchParticipant { .. }
            | TournamentError::InvalidWinner { .. }
            | TournamentError::MalformedScores { .. }
            | TournamentError::DuplicateParticipant(_)
            | TournamentError::InvalidConfig(_)
            | TournamentError::CorruptState(_) => ErrorKind::Validation,

            TournamentError::MatchNotInProgress { .. }
            | TournamentError::MatchAlreadyCompleted(_)
            | TournamentError::MatchNotReady(_)
            | TournamentError::RoundIncomplete { .. }
            | TournamentError::ReseedNotAllowed(_)
            | TournamentError::InvalidState { .. }
            | TournamentError::NotEnoughParticipants { .. }
            | TournamentError::TournamentFull(_)
            | TournamentError::InvalidTransition { .. } => ErrorKind::State,

            TournamentError::VersionConflict { .. } => ErrorKind::Conflict,

            TournamentError::TournamentNotFound(_) => ErrorKind::NotFound,

            TournamentError::ActorUnavailable(_) | TournamentError::Serialization(_) => {
                ErrorKind::Unavailable
            }
        }
    }

    /// Get a client-safe error message
    ///
    /// Internal failures are reduced to a generic message, everything else is
    /// safe to show to the players involved.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Serialization(_) | TournamentError::CorruptState(_) => {
                "Internal server error".to_string()
            }
            TournamentError::ActorUnavailable(_) => "Tournament is unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
