//! Single-elimination bracket engine.
//!
//! This module provides:
//! - Participant registry with seeding and Fisher-Yates shuffling
//! - Bracket generation with automatic byes for odd player counts
//! - Round progression gated on completion of the current round
//! - Two-sided result reporting with dispute detection and admin override
//!
//! The engine is pure transition logic over an in-memory [`Tournament`]
//! aggregate. It performs no I/O and no locking; callers serialize mutations
//! (see [`crate::host`]) and persist the aggregate themselves.
//!
//! ## Example
//!
//! ```
//! use knockout::tournament::{ReportOutcome, RoundOutcome, Tournament, TournamentConfig};
//!
//! let config = TournamentConfig {
//!     shuffle_on_start: false,
//!     ..TournamentConfig::default()
//! };
//! let mut cup = Tournament::new(1, "Friday Cup", config).unwrap();
//! cup.create_bracket(&[10, 20]).unwrap();
//!
//! assert_eq!(
//!     cup.report_result("r1m1", 10, 10).unwrap(),
//!     ReportOutcome::AwaitingConfirmation
//! );
//! cup.report_result("r1m1", 20, 10).unwrap();
//! assert_eq!(cup.champion(), Some(10));
//! assert_eq!(cup.advance_round().unwrap(), RoundOutcome::Completed { winner: 10 });
//! ```

pub mod bracket;
pub mod consensus;
pub mod errors;
pub mod events;
pub mod models;
pub mod progression;
pub mod registry;
pub mod state;

pub use bracket::{Bracket, build_round};
pub use errors::{ErrorKind, TournamentError, TournamentResult};
pub use events::{EventEnvelope, TournamentEvent};
pub use models::{
    Match, MatchId, MatchScores, MatchStatus, Participant, ParticipantStatus, ReportOutcome,
    ResultReport, RoundOutcome, Standing, TournamentConfig, TournamentId, TournamentStatus,
    TournamentSummary, UserId,
};
pub use registry::Registry;
pub use state::Tournament;
