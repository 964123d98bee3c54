//! Tournament actor message types.

use crate::tournament::{
    Match, MatchId, ReportOutcome, RoundOutcome, Standing, Tournament, TournamentResult,
    TournamentSummary, UserId,
};
use tokio::sync::oneshot;

/// Reply channel for operations that can fail
pub type Reply<T> = oneshot::Sender<TournamentResult<T>>;

/// Messages that can be sent to a TournamentActor
#[derive(Debug)]
pub enum TournamentMessage {
    /// Register a participant (returns the seed)
    Register {
        user_id: UserId,
        response: Reply<u32>,
    },

    /// Withdraw a participant during registration
    Withdraw {
        user_id: UserId,
        response: Reply<()>,
    },

    /// Close registration and build round 1
    Start { response: Reply<Vec<Match>> },

    /// Replace the registrations with an ordered list and build round 1
    CreateBracket {
        participants: Vec<UserId>,
        response: Reply<Vec<Match>>,
    },

    /// Shuffle seeds and rebuild round 1
    Reseed { response: Reply<Vec<Match>> },

    /// Start a pending match (manual start mode)
    StartMatch {
        match_id: MatchId,
        response: Reply<Match>,
    },

    /// Participant self-report
    ReportResult {
        match_id: MatchId,
        reporter_id: UserId,
        claimed_winner_id: UserId,
        response: Reply<ReportOutcome>,
    },

    /// Admin override
    ResolveDispute {
        match_id: MatchId,
        winner_id: UserId,
        resolver_id: UserId,
        response: Reply<Match>,
    },

    /// Generate the next round
    AdvanceRound { response: Reply<RoundOutcome> },

    /// Get the tournament overview
    GetSummary {
        response: oneshot::Sender<TournamentSummary>,
    },

    /// Get a copy of the whole aggregate
    GetSnapshot {
        response: oneshot::Sender<Tournament>,
    },

    /// Get the standings
    GetStandings {
        response: oneshot::Sender<Vec<Standing>>,
    },

    /// Get one match
    GetMatch {
        match_id: MatchId,
        response: Reply<Match>,
    },

    /// Get the matches of a round, or all of them
    GetMatches {
        round: Option<u32>,
        response: oneshot::Sender<Vec<Match>>,
    },

    /// Stop the actor
    Close { response: oneshot::Sender<()> },
}
