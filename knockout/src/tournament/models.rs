//! Tournament data models for single-elimination brackets.

use super::errors::{TournamentError, TournamentResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tournament ID type
pub type TournamentId = i64;

/// User ID type (participants, reporters and admins)
pub type UserId = i64;

/// Match ID type, unique within a tournament (`r{round}m{index}` / `r{round}bye{index}`)
pub type MatchId = String;

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting registrations, bracket may be previewed
    Registration,
    /// Bracket generated, matches being played
    Ongoing,
    /// A champion has been declared
    Completed,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentStatus::Registration => write!(f, "registration"),
            TournamentStatus::Ongoing => write!(f, "ongoing"),
            TournamentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Participant status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Registered,
    Eliminated,
    Winner,
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantStatus::Registered => write!(f, "registered"),
            ParticipantStatus::Eliminated => write!(f, "eliminated"),
            ParticipantStatus::Winner => write!(f, "winner"),
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Waiting for players or for the match to be started
    Pending,
    /// Both players seated, accepting result reports
    InProgress,
    /// Winner decided
    Completed,
    /// Withdrawn from the bracket
    Cancelled,
    /// Conflicting self-reports, waiting for an admin
    Disputed,
}

impl MatchStatus {
    /// Exhaustive transition table for the match state machine.
    ///
    /// `Pending -> Completed` covers admin resolution of a match that was never
    /// started. `Disputed -> Completed` is only reachable through an admin override,
    /// which the consensus protocol enforces separately.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        use MatchStatus::*;
        match self {
            Pending => matches!(next, InProgress | Completed | Cancelled),
            InProgress => matches!(next, Completed | Disputed | Cancelled),
            Disputed => matches!(next, Completed),
            Completed | Cancelled => false,
        }
    }

    /// Whether the match still needs a decision
    pub fn is_open(self) -> bool {
        matches!(
            self,
            MatchStatus::Pending | MatchStatus::InProgress | MatchStatus::Disputed
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
            MatchStatus::Disputed => write!(f, "disputed"),
        }
    }
}

/// Registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// User ID
    pub user_id: UserId,
    /// Bracket seed (1..=N)
    pub seed: u32,
    /// Current status
    pub status: ParticipantStatus,
    /// Round the participant was knocked out in
    pub eliminated_in_round: Option<u32>,
    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    /// Create a freshly registered participant
    pub fn new(user_id: UserId, seed: u32) -> Self {
        Self {
            user_id,
            seed,
            status: ParticipantStatus::Registered,
            eliminated_in_round: None,
            registered_at: Utc::now(),
        }
    }
}

/// Binary match score (1 for the winner, 0 for the loser)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScores {
    pub player1: u8,
    pub player2: u8,
}

impl MatchScores {
    /// Scores for a decided match
    pub fn decided(player1_won: bool) -> Self {
        if player1_won {
            Self {
                player1: 1,
                player2: 0,
            }
        } else {
            Self {
                player1: 0,
                player2: 1,
            }
        }
    }

    /// Check the score against the match outcome
    pub fn is_consistent_with(&self, m: &Match) -> bool {
        match (m.status, m.winner) {
            (MatchStatus::Completed, Some(winner)) => {
                *self == Self::decided(m.player1 == Some(winner))
            }
            _ => *self == Self::default(),
        }
    }
}

/// A self-reported result claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReport {
    pub reporter_id: UserId,
    pub claimed_winner_id: UserId,
    pub reported_at: DateTime<Utc>,
}

impl ResultReport {
    pub fn new(reporter_id: UserId, claimed_winner_id: UserId) -> Self {
        Self {
            reporter_id,
            claimed_winner_id,
            reported_at: Utc::now(),
        }
    }
}

/// Bracket match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Match ID (unique per tournament)
    pub id: MatchId,
    /// Round number (1-indexed)
    pub round: u32,
    /// Pairing slot within the round (1-indexed)
    pub position: u32,
    pub player1: Option<UserId>,
    pub player2: Option<UserId>,
    pub winner: Option<UserId>,
    pub status: MatchStatus,
    pub scores: MatchScores,
    /// At most one report per match participant
    pub result_reports: Vec<ResultReport>,
    pub is_bye: bool,
    /// Match the winner feeds into
    pub next_match_id: Option<MatchId>,
    pub admin_resolved: bool,
    pub resolved_by: Option<UserId>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// ID of the `index`-th regular match of a round
    pub fn regular_id(round: u32, index: usize) -> MatchId {
        format!("r{round}m{index}")
    }

    /// ID of the `index`-th bye of a round
    pub fn bye_id(round: u32, index: usize) -> MatchId {
        format!("r{round}bye{index}")
    }

    /// Create a pending match
    pub fn new(
        id: MatchId,
        round: u32,
        position: u32,
        player1: Option<UserId>,
        player2: Option<UserId>,
    ) -> Self {
        Self {
            id,
            round,
            position,
            player1,
            player2,
            winner: None,
            status: MatchStatus::Pending,
            scores: MatchScores::default(),
            result_reports: Vec::new(),
            is_bye: false,
            next_match_id: None,
            admin_resolved: false,
            resolved_by: None,
            completed_at: None,
        }
    }

    /// Create a bye, already resolved in favour of `player`
    pub fn bye(id: MatchId, round: u32, position: u32, player: UserId) -> Self {
        Self {
            winner: Some(player),
            status: MatchStatus::Completed,
            scores: MatchScores::decided(true),
            is_bye: true,
            completed_at: Some(Utc::now()),
            ..Self::new(id, round, position, Some(player), None)
        }
    }

    /// Whether `user_id` plays in this match
    pub fn has_player(&self, user_id: UserId) -> bool {
        self.player1 == Some(user_id) || self.player2 == Some(user_id)
    }

    /// Both slots are filled
    pub fn is_ready(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }

    /// The other player of the match
    pub fn opponent_of(&self, user_id: UserId) -> Option<UserId> {
        if self.player1 == Some(user_id) {
            self.player2
        } else if self.player2 == Some(user_id) {
            self.player1
        } else {
            None
        }
    }

    /// Loser of a decided match (None for byes)
    pub fn loser(&self) -> Option<UserId> {
        self.winner.and_then(|winner| self.opponent_of(winner))
    }

    /// Position of the match this one feeds in the next round
    pub fn next_position(&self) -> u32 {
        self.position.div_ceil(2)
    }

    /// Odd positions feed player1 of the next match, even positions player2
    pub fn feeds_first_slot(&self) -> bool {
        self.position % 2 == 1
    }

    /// Move to `next` if the state machine allows it
    pub(crate) fn transition(&mut self, next: MatchStatus) -> TournamentResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(TournamentError::InvalidTransition {
                match_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Store a report, replacing any earlier report by the same reporter
    pub(crate) fn record_report(&mut self, report: ResultReport) {
        match self
            .result_reports
            .iter_mut()
            .find(|r| r.reporter_id == report.reporter_id)
        {
            Some(existing) => *existing = report,
            None => self.result_reports.push(report),
        }
    }
}

/// Tournament configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Minimum participants required to build a bracket
    pub min_participants: usize,
    /// Maximum participants allowed
    pub max_participants: usize,
    /// Shuffle seeds when the bracket is built and nobody shuffled yet
    pub shuffle_on_start: bool,
    /// Move matches to in-progress as soon as both players are known
    pub auto_start_matches: bool,
    /// Advance to the next round when the last open match of a round finalizes
    pub auto_advance: bool,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            min_participants: 2,
            max_participants: 64,
            shuffle_on_start: true,
            auto_start_matches: true,
            auto_advance: false,
        }
    }
}

impl TournamentConfig {
    /// Validate configuration
    pub fn validate(&self) -> TournamentResult<()> {
        if self.min_participants < 2 {
            return Err(TournamentError::InvalidConfig(
                "Minimum participants must be at least 2".to_string(),
            ));
        }

        if self.max_participants < self.min_participants {
            return Err(TournamentError::InvalidConfig(format!(
                "Maximum participants ({}) must be at least the minimum ({})",
                self.max_participants, self.min_participants
            )));
        }

        Ok(())
    }
}

/// Result of [`advance_round`](super::Tournament::advance_round)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Next round generated
    Advanced { round: u32, matches: Vec<Match> },
    /// One player left standing
    Completed { winner: UserId },
}

/// Result of [`report_result`](super::Tournament::report_result)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReportOutcome {
    /// Waiting for the other participant
    AwaitingConfirmation,
    /// Both reports agree, match finalized
    Finalized { winner: UserId },
    /// Reports disagree, admin needed
    Disputed { reports: Vec<ResultReport> },
}

/// Tournament overview used for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TournamentSummary {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    /// Round needing attention (see `Tournament::current_round`)
    pub current_round: u32,
    pub participant_count: usize,
    pub remaining_players: usize,
    pub match_count: usize,
    pub shuffle_count: u32,
    pub champion: Option<UserId>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Final or running standing of a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub user_id: UserId,
    pub seed: u32,
    pub status: ParticipantStatus,
    pub eliminated_in_round: Option<u32>,
}
