//! Tournament aggregate: registration, bracket generation and reseeding.
//!
//! Round progression lives in [`super::progression`] and the result consensus
//! protocol in [`super::consensus`]; both extend [`Tournament`] with further
//! `impl` blocks. Every public mutator validates first and only then mutates, so a
//! returned error always leaves the aggregate untouched. Each successful mutation
//! bumps `version` exactly once, which the persistence layer uses for
//! compare-and-swap saves.

use super::{
    bracket::{Bracket, build_round},
    errors::{TournamentError, TournamentResult},
    events::TournamentEvent,
    models::{
        Match, MatchId, MatchStatus, ParticipantStatus, Standing, TournamentConfig,
        TournamentId, TournamentStatus, TournamentSummary, UserId,
    },
    registry::Registry,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Single-elimination tournament aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub(super) id: TournamentId,
    pub(super) name: String,
    pub(super) status: TournamentStatus,
    pub(super) config: TournamentConfig,
    #[serde(rename = "participants")]
    pub(super) registry: Registry,
    #[serde(rename = "matches")]
    pub(super) bracket: Bracket,
    pub(super) current_round: u32,
    pub(super) shuffle_count: u32,
    /// Current seeds come from a shuffle, so `start` keeps them
    #[serde(default)]
    pub(super) seeds_shuffled: bool,
    pub(super) version: u64,
    pub(super) champion: Option<UserId>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) started_at: Option<DateTime<Utc>>,
    pub(super) completed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub(super) events: Vec<TournamentEvent>,
}

impl Tournament {
    /// Create a tournament in the registration phase
    pub fn new(
        id: TournamentId,
        name: impl Into<String>,
        config: TournamentConfig,
    ) -> TournamentResult<Self> {
        config.validate()?;

        Ok(Self {
            id,
            name: name.into(),
            status: TournamentStatus::Registration,
            config,
            registry: Registry::new(),
            bracket: Bracket::new(),
            current_round: 0,
            shuffle_count: 0,
            seeds_shuffled: false,
            version: 0,
            champion: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            events: Vec::new(),
        })
    }

    pub fn id(&self) -> TournamentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TournamentStatus {
        self.status
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn participants(&self) -> &Registry {
        &self.registry
    }

    pub fn bracket(&self) -> &Bracket {
        &self.bracket
    }

    /// Stored round counter (highest generated round)
    pub fn round_counter(&self) -> u32 {
        self.current_round
    }

    pub fn shuffle_count(&self) -> u32 {
        self.shuffle_count
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn champion(&self) -> Option<UserId> {
        self.champion
    }

    pub fn get_match(&self, match_id: &str) -> TournamentResult<&Match> {
        self.bracket
            .get(match_id)
            .ok_or_else(|| TournamentError::MatchNotFound(match_id.to_string()))
    }

    /// Matches of a round in position order
    pub fn matches_in_round(&self, round: u32) -> Vec<&Match> {
        self.bracket.round(round).collect()
    }

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<TournamentEvent> {
        std::mem::take(&mut self.events)
    }

    /// Register a participant; returns the assigned seed
    pub fn register_participant(&mut self, user_id: UserId) -> TournamentResult<u32> {
        self.require_status(TournamentStatus::Registration)?;
        let seed = self
            .registry
            .register(user_id, self.config.max_participants)?;
        self.discard_preview();
        self.touch();
        log::debug!(
            "Tournament {}: user {} registered with seed {}",
            self.id,
            user_id,
            seed
        );
        Ok(seed)
    }

    /// Withdraw a participant before the bracket is generated
    pub fn withdraw_participant(&mut self, user_id: UserId) -> TournamentResult<()> {
        self.require_status(TournamentStatus::Registration)?;
        self.registry.withdraw(user_id)?;
        self.discard_preview();
        self.touch();
        Ok(())
    }

    /// Shuffle seeds during registration without building a bracket
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TournamentResult<()> {
        self.require_status(TournamentStatus::Registration)?;
        self.registry.shuffle(rng);
        self.shuffle_count += 1;
        self.seeds_shuffled = true;
        self.discard_preview();
        self.touch();
        Ok(())
    }

    /// Replace the registrations with `participants` (in order) and build round 1
    pub fn create_bracket(&mut self, participants: &[UserId]) -> TournamentResult<Vec<Match>> {
        self.create_bracket_with(participants, &mut rand::rng())
    }

    /// [`create_bracket`](Self::create_bracket) with a caller-provided RNG
    pub fn create_bracket_with<R: Rng + ?Sized>(
        &mut self,
        participants: &[UserId],
        rng: &mut R,
    ) -> TournamentResult<Vec<Match>> {
        self.require_status(TournamentStatus::Registration)?;

        if participants.len() > self.config.max_participants {
            return Err(TournamentError::TournamentFull(self.config.max_participants));
        }
        self.require_enough(participants.len())?;

        let registry = Registry::from_user_ids(participants)?;
        if registry.seeded_ids() != self.registry.seeded_ids() {
            // New lineup, any earlier shuffle no longer applies
            self.registry = registry;
            self.seeds_shuffled = false;
        }

        self.start_with(rng)
    }

    /// Close registration and build round 1 from the registered participants
    pub fn start(&mut self) -> TournamentResult<Vec<Match>> {
        self.start_with(&mut rand::rng())
    }

    /// [`start`](Self::start) with a caller-provided RNG
    pub fn start_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TournamentResult<Vec<Match>> {
        self.require_status(TournamentStatus::Registration)?;
        self.require_enough(self.registry.len())?;

        if !self.seeds_shuffled && self.config.shuffle_on_start {
            self.registry.shuffle(rng);
            self.shuffle_count += 1;
            self.seeds_shuffled = true;
        }

        self.bracket.clear();
        self.status = TournamentStatus::Ongoing;
        self.started_at = Some(Utc::now());
        let matches = self.generate_first_round();
        self.touch();

        log::info!(
            "Tournament {} '{}' started with {} participants ({} matches in round 1)",
            self.id,
            self.name,
            self.registry.len(),
            matches.len()
        );

        Ok(matches)
    }

    /// Shuffle seeds and rebuild the bracket from scratch.
    ///
    /// Only allowed during registration; the rebuilt bracket is a preview whose
    /// matches stay pending until [`start`](Self::start). A replaced preview is
    /// announced through [`TournamentEvent::BracketRegenerated`].
    pub fn reseed(&mut self) -> TournamentResult<Vec<Match>> {
        self.reseed_with(&mut rand::rng())
    }

    /// [`reseed`](Self::reseed) with a caller-provided RNG
    pub fn reseed_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TournamentResult<Vec<Match>> {
        match self.status {
            TournamentStatus::Registration => {}
            TournamentStatus::Ongoing => {
                return Err(TournamentError::ReseedNotAllowed(
                    "bracket is already in play".to_string(),
                ));
            }
            TournamentStatus::Completed => {
                return Err(TournamentError::ReseedNotAllowed(
                    "tournament is completed".to_string(),
                ));
            }
        }
        self.require_enough(self.registry.len())?;

        self.registry.shuffle(rng);
        self.shuffle_count += 1;
        self.seeds_shuffled = true;

        let discarded = self.bracket.clear();
        if !discarded.is_empty() {
            self.events.push(TournamentEvent::BracketRegenerated {
                shuffle_count: self.shuffle_count,
                discarded,
            });
        }

        let matches = self.generate_first_round();
        self.touch();

        log::info!(
            "Tournament {}: reseeded (shuffle #{}), {} matches in round 1",
            self.id,
            self.shuffle_count,
            matches.len()
        );

        Ok(matches)
    }

    /// Overview for listings
    pub fn summary(&self) -> TournamentSummary {
        TournamentSummary {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            current_round: self.current_round(),
            participant_count: self.registry.len(),
            remaining_players: self.registry.remaining(),
            match_count: self.bracket.len(),
            shuffle_count: self.shuffle_count,
            champion: self.champion,
            version: self.version,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }

    /// Champion first, then players still in, then by elimination round (latest first)
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .registry
            .iter()
            .map(|p| Standing {
                user_id: p.user_id,
                seed: p.seed,
                status: p.status,
                eliminated_in_round: p.eliminated_in_round,
            })
            .collect();

        standings.sort_by_key(|s| {
            let rank = match s.status {
                ParticipantStatus::Winner => 0,
                ParticipantStatus::Registered => 1,
                ParticipantStatus::Eliminated => 2,
            };
            (
                rank,
                std::cmp::Reverse(s.eliminated_in_round.unwrap_or(0)),
                s.seed,
            )
        });
        standings
    }

    /// Check the invariants of a loaded aggregate
    pub fn validate(&self) -> TournamentResult<()> {
        self.config.validate()?;
        self.registry.validate()?;

        for m in self.bracket.iter() {
            self.validate_match(m)?;
        }

        if self.status == TournamentStatus::Completed && self.champion.is_none() {
            return Err(TournamentError::CorruptState(
                "completed tournament without a champion".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_match(&self, m: &Match) -> TournamentResult<()> {
        let corrupt = |reason: &str| TournamentError::CorruptState(format!("{}: {reason}", m.id));

        if m.result_reports.len() > 2 {
            return Err(corrupt("more than two result reports"));
        }

        if m.is_bye
            && (m.player2.is_some() || m.status != MatchStatus::Completed || m.winner != m.player1)
        {
            return Err(corrupt("malformed bye"));
        }

        for player in [m.player1, m.player2].into_iter().flatten() {
            if !self.registry.contains(player) {
                return Err(TournamentError::ParticipantNotFound(player));
            }
        }

        if let Some(winner) = m.winner
            && !m.has_player(winner)
        {
            return Err(TournamentError::InvalidWinner {
                match_id: m.id.clone(),
                winner_id: winner,
            });
        }

        if !m.scores.is_consistent_with(m) {
            return Err(TournamentError::MalformedScores {
                match_id: m.id.clone(),
                player1: m.scores.player1,
                player2: m.scores.player2,
            });
        }

        if let Some(next) = &m.next_match_id
            && self.bracket.get(next).is_none()
        {
            return Err(corrupt("dangling next_match_id"));
        }

        Ok(())
    }

    /// Build round 1 from the current seeds; starts ready matches when ongoing
    fn generate_first_round(&mut self) -> Vec<Match> {
        self.current_round = 1;
        for m in build_round(1, &self.registry.seeded_ids()) {
            self.bracket.insert(m);
        }

        if self.status == TournamentStatus::Ongoing {
            let ids: Vec<MatchId> = self.bracket.round(1).map(|m| m.id.clone()).collect();
            for id in ids {
                self.activate(&id);
            }
        }

        self.bracket.round(1).cloned().collect()
    }

    /// Registration changed, so a previewed bracket is stale
    fn discard_preview(&mut self) {
        if !self.bracket.is_empty() {
            self.bracket.clear();
            self.current_round = 0;
        }
    }

    pub(super) fn require_status(&self, expected: TournamentStatus) -> TournamentResult<()> {
        if self.status != expected {
            return Err(TournamentError::InvalidState {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    fn require_enough(&self, current: usize) -> TournamentResult<()> {
        let needed = self.config.min_participants;
        if current < needed {
            return Err(TournamentError::NotEnoughParticipants { needed, current });
        }
        Ok(())
    }

    pub(super) fn match_mut(&mut self, match_id: &str) -> TournamentResult<&mut Match> {
        self.bracket
            .get_mut(match_id)
            .ok_or_else(|| TournamentError::MatchNotFound(match_id.to_string()))
    }

    /// Start a pending match with both players if auto start is on
    pub(super) fn activate(&mut self, match_id: &str) {
        if !self.config.auto_start_matches {
            return;
        }

        let Some(m) = self.bracket.get_mut(match_id) else {
            return;
        };

        if m.is_bye || m.status != MatchStatus::Pending {
            return;
        }

        if let (Some(player1), Some(player2)) = (m.player1, m.player2)
            && m.transition(MatchStatus::InProgress).is_ok()
        {
            self.events.push(TournamentEvent::MatchReady {
                match_id: m.id.clone(),
                round: m.round,
                player1,
                player2,
            });
        }
    }

    pub(super) fn complete_tournament(&mut self, winner: UserId) {
        self.status = TournamentStatus::Completed;
        self.champion = Some(winner);
        self.completed_at = Some(Utc::now());
        self.registry.crown(winner);
        self.events
            .push(TournamentEvent::TournamentCompleted { winner });

        log::info!(
            "Tournament {} '{}' completed after {} round(s), champion {}",
            self.id,
            self.name,
            self.current_round,
            winner
        );
    }

    pub(super) fn touch(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::errors::ErrorKind;
    use rand::{SeedableRng, rngs::StdRng};

    fn unshuffled() -> TournamentConfig {
        TournamentConfig {
            shuffle_on_start: false,
            ..TournamentConfig::default()
        }
    }

    fn registered(ids: &[UserId]) -> Tournament {
        let mut t = Tournament::new(1, "Test Cup", unshuffled()).unwrap();
        for &id in ids {
            t.register_participant(id).unwrap();
        }
        t
    }

    #[test]
    fn test_new_tournament_is_in_registration() {
        let t = Tournament::new(1, "Test Cup", TournamentConfig::default()).unwrap();
        assert_eq!(t.status(), TournamentStatus::Registration);
        assert_eq!(t.round_counter(), 0);
        assert_eq!(t.version(), 0);
        assert!(t.bracket().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TournamentConfig {
            max_participants: 1,
            ..TournamentConfig::default()
        };
        assert!(Tournament::new(1, "Broken", config).is_err());
    }

    #[test]
    fn test_start_requires_two_participants() {
        let mut t = registered(&[1]);
        let err = t.start().unwrap_err();
        assert!(matches!(
            err,
            TournamentError::NotEnoughParticipants {
                needed: 2,
                current: 1
            }
        ));
        assert_eq!(t.status(), TournamentStatus::Registration);
        assert!(t.bracket().is_empty());
    }

    #[test]
    fn test_start_keeps_registration_order_without_shuffle() {
        let mut t = registered(&[10, 20, 30, 40]);
        let matches = t.start().unwrap();

        assert_eq!(t.status(), TournamentStatus::Ongoing);
        assert_eq!(t.shuffle_count(), 0);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].player1, Some(10));
        assert_eq!(matches[0].player2, Some(20));
        assert!(matches.iter().all(|m| m.status == MatchStatus::InProgress));

        let events = t.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], TournamentEvent::MatchReady { .. }));
    }

    #[test]
    fn test_start_shuffles_once_by_default() {
        let mut t = Tournament::new(1, "Test Cup", TournamentConfig::default()).unwrap();
        for id in 1..=8 {
            t.register_participant(id).unwrap();
        }
        t.start_with(&mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(t.shuffle_count(), 1);
        assert!(t.participants().validate().is_ok());
    }

    #[test]
    fn test_registration_closed_after_start() {
        let mut t = registered(&[1, 2]);
        t.start().unwrap();

        let err = t.register_participant(3).unwrap_err();
        assert!(matches!(err, TournamentError::InvalidState { .. }));
        let err = t.start().unwrap_err();
        assert!(matches!(err, TournamentError::InvalidState { .. }));
    }

    #[test]
    fn test_create_bracket_uses_given_order() {
        let mut t = Tournament::new(1, "Test Cup", unshuffled()).unwrap();
        let matches = t.create_bracket(&[5, 4, 3]).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!((matches[0].player1, matches[0].player2), (Some(5), Some(4)));
        assert!(matches[1].is_bye);
        assert_eq!(matches[1].winner, Some(3));
    }

    #[test]
    fn test_create_bracket_rejects_duplicates_without_mutation() {
        let mut t = Tournament::new(1, "Test Cup", unshuffled()).unwrap();
        let err = t.create_bracket(&[1, 2, 1]).unwrap_err();
        assert!(matches!(err, TournamentError::DuplicateParticipant(1)));
        assert!(t.participants().is_empty());
        assert_eq!(t.version(), 0);
    }

    #[test]
    fn test_reseed_in_registration_builds_preview() {
        let mut t = Tournament::new(1, "Test Cup", TournamentConfig::default()).unwrap();
        for id in 1..=5 {
            t.register_participant(id).unwrap();
        }
        let preview = t.reseed_with(&mut StdRng::seed_from_u64(9)).unwrap();

        assert_eq!(t.status(), TournamentStatus::Registration);
        assert_eq!(t.shuffle_count(), 1);
        assert_eq!(preview.len(), 3);
        assert!(
            preview
                .iter()
                .filter(|m| !m.is_bye)
                .all(|m| m.status == MatchStatus::Pending)
        );

        // Start reuses the shuffled seeds instead of shuffling again
        let seeds = t.participants().seeded_ids();
        t.start().unwrap();
        assert_eq!(t.shuffle_count(), 1);
        assert_eq!(t.participants().seeded_ids(), seeds);
    }

    #[test]
    fn test_registration_change_discards_preview() {
        let mut t = registered(&[1, 2, 3]);
        t.reseed().unwrap();
        assert!(!t.bracket().is_empty());

        t.register_participant(4).unwrap();
        assert!(t.bracket().is_empty());
    }

    #[test]
    fn test_reseed_replaces_registration_preview() {
        let mut t = registered(&[1, 2, 3, 4]);
        t.reseed_with(&mut StdRng::seed_from_u64(1)).unwrap();
        assert!(t.drain_events().is_empty());

        t.reseed_with(&mut StdRng::seed_from_u64(2)).unwrap();
        let events = t.drain_events();
        assert!(matches!(
            &events[0],
            TournamentEvent::BracketRegenerated { discarded, shuffle_count: 2 } if discarded.len() == 2
        ));
        assert_eq!(t.matches_in_round(1).len(), 2);
    }

    #[test]
    fn test_reseed_once_started_is_rejected() {
        let mut t = registered(&[1, 2, 3, 4]);
        let round1 = t.start().unwrap();
        t.drain_events();
        let version = t.version();

        let err = t.reseed().unwrap_err();
        assert!(matches!(err, TournamentError::ReseedNotAllowed(_)));
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(t.version(), version);
        assert_eq!(t.shuffle_count(), 0);
        assert!(t.drain_events().is_empty());
        assert_eq!(t.matches_in_round(1).into_iter().cloned().collect::<Vec<_>>(), round1);
    }

    #[test]
    fn test_new_lineup_keeps_shuffle_count() {
        let mut t = Tournament::new(1, "Test Cup", TournamentConfig::default()).unwrap();
        for id in 1..=4 {
            t.register_participant(id).unwrap();
        }
        t.shuffle(&mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(t.shuffle_count(), 1);

        // Different field, so the start shuffle runs again on top of the earlier one
        t.create_bracket_with(&[7, 8, 9], &mut StdRng::seed_from_u64(6))
            .unwrap();
        assert_eq!(t.shuffle_count(), 2);

        let mut seeded = t.participants().seeded_ids();
        seeded.sort_unstable();
        assert_eq!(seeded, vec![7, 8, 9]);
    }

    #[test]
    fn test_same_lineup_keeps_earlier_shuffle() {
        let mut t = Tournament::new(1, "Test Cup", TournamentConfig::default()).unwrap();
        for id in 1..=4 {
            t.register_participant(id).unwrap();
        }
        t.shuffle(&mut StdRng::seed_from_u64(5)).unwrap();
        let seeds = t.participants().seeded_ids();

        t.create_bracket_with(&seeds, &mut StdRng::seed_from_u64(6))
            .unwrap();
        assert_eq!(t.shuffle_count(), 1);
        assert_eq!(t.participants().seeded_ids(), seeds);
    }

    #[test]
    fn test_reseed_after_report_is_rejected() {
        let mut t = registered(&[1, 2, 3, 4]);
        t.start().unwrap();
        t.report_result("r1m1", 1, 1).unwrap();
        let version = t.version();

        let err = t.reseed().unwrap_err();
        assert!(matches!(err, TournamentError::ReseedNotAllowed(_)));
        assert_eq!(t.version(), version);
        assert_eq!(t.get_match("r1m1").unwrap().result_reports.len(), 1);
    }

    #[test]
    fn test_validate_detects_malformed_scores() {
        let mut t = registered(&[1, 2]);
        t.start().unwrap();
        assert!(t.validate().is_ok());

        t.bracket.get_mut("r1m1").unwrap().scores.player1 = 1;
        let err = t.validate().unwrap_err();
        assert!(matches!(err, TournamentError::MalformedScores { .. }));
    }

    #[test]
    fn test_validate_detects_unknown_players() {
        let mut t = registered(&[1, 2]);
        t.start().unwrap();
        t.bracket.get_mut("r1m1").unwrap().player2 = Some(99);

        let err = t.validate().unwrap_err();
        assert!(matches!(err, TournamentError::ParticipantNotFound(99)));
    }

    #[test]
    fn test_serde_roundtrip_preserves_bracket() {
        let mut t = registered(&[1, 2, 3]);
        t.start().unwrap();

        let json = serde_json::to_string(&t).unwrap();
        let restored: Tournament = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.bracket(), t.bracket());
        assert_eq!(restored.participants(), t.participants());
        assert_eq!(restored.version(), t.version());
        assert!(restored.validate().is_ok());
    }
}
