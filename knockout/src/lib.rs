//! # Knockout
//!
//! A single-elimination tournament engine built around an explicit bracket
//! state machine.
//!
//! The engine seeds participants, builds a bracket with automatic byes for
//! player counts that are not a power of two, gates each round on the
//! completion of the previous one and settles matches through a two-sided
//! self-report protocol with an admin override for disputes.
//!
//! ## Core Modules
//!
//! - [`tournament`]: Bracket engine (registry, bracket, progression, consensus)
//! - [`host`]: One async actor per tournament serializing all mutations
//! - [`store`]: Persistence boundary with compare-and-swap saves
//! - [`delivery`]: Retrying, rate-limited delivery of domain events
//!
//! ## Example
//!
//! ```
//! use knockout::{RoundOutcome, Tournament, TournamentConfig};
//!
//! let config = TournamentConfig {
//!     shuffle_on_start: false,
//!     ..TournamentConfig::default()
//! };
//! let mut cup = Tournament::new(1, "Sunday Cup", config).unwrap();
//! let round1 = cup.create_bracket(&[1, 2, 3]).unwrap();
//! assert_eq!(round1.len(), 2);
//! assert!(round1[1].is_bye);
//!
//! cup.report_result("r1m1", 1, 1).unwrap();
//! cup.report_result("r1m1", 2, 1).unwrap();
//! let RoundOutcome::Advanced { matches, .. } = cup.advance_round().unwrap() else {
//!     unreachable!();
//! };
//! assert_eq!((matches[0].player1, matches[0].player2), (Some(1), Some(3)));
//! ```

/// Bracket engine: models, registry, bracket, progression and consensus.
pub mod tournament;
pub use tournament::{
    ErrorKind, EventEnvelope, Match, MatchId, MatchStatus, ReportOutcome, RoundOutcome,
    Tournament, TournamentConfig, TournamentError, TournamentEvent, TournamentId,
    TournamentResult, TournamentStatus, UserId,
};

/// Actor-based hosting of live tournaments.
pub mod host;

/// Delivery of domain events to external sinks.
pub mod delivery;

/// Tournament persistence.
pub mod store;
