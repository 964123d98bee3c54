//! Participant registry: ordered, seed-seekable participant list.

use super::{
    errors::{TournamentError, TournamentResult},
    models::{Participant, ParticipantStatus, UserId},
};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// Participants kept in seed order (`participants[i].seed == i + 1`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    participants: Vec<Participant>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an ordered list of user IDs
    pub fn from_user_ids(user_ids: &[UserId]) -> TournamentResult<Self> {
        let mut registry = Self::new();
        for &user_id in user_ids {
            registry.register(user_id, usize::MAX)?;
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participants in seed order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.get(user_id).is_some()
    }

    pub fn get(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    /// Look up the participant holding `seed`
    pub fn by_seed(&self, seed: u32) -> Option<&Participant> {
        let index = usize::try_from(seed).ok()?.checked_sub(1)?;
        self.participants.get(index)
    }

    /// User IDs in seed order
    pub fn seeded_ids(&self) -> Vec<UserId> {
        self.participants.iter().map(|p| p.user_id).collect()
    }

    /// Participants not knocked out yet
    pub fn remaining(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.status != ParticipantStatus::Eliminated)
            .count()
    }

    /// Register a participant at the bottom seed
    pub fn register(&mut self, user_id: UserId, max: usize) -> TournamentResult<u32> {
        if self.contains(user_id) {
            return Err(TournamentError::DuplicateParticipant(user_id));
        }

        if self.participants.len() >= max {
            return Err(TournamentError::TournamentFull(max));
        }

        let seed = self.next_seed();
        self.participants.push(Participant::new(user_id, seed));
        Ok(seed)
    }

    /// Remove a participant and close the gap in the seeds
    pub fn withdraw(&mut self, user_id: UserId) -> TournamentResult<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.user_id == user_id)
            .ok_or(TournamentError::ParticipantNotFound(user_id))?;

        let removed = self.participants.remove(index);
        self.reassign_seeds();
        Ok(removed)
    }

    /// Fisher-Yates permute participants and reassign seed = index + 1
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.participants.shuffle(rng);
        self.reassign_seeds();
    }

    /// Reset everyone to `Registered` (bracket discarded)
    pub fn reset_statuses(&mut self) {
        for participant in &mut self.participants {
            participant.status = ParticipantStatus::Registered;
            participant.eliminated_in_round = None;
        }
    }

    pub(crate) fn eliminate(&mut self, user_id: UserId, round: u32) {
        if let Some(participant) = self.get_mut(user_id) {
            participant.status = ParticipantStatus::Eliminated;
            participant.eliminated_in_round = Some(round);
        }
    }

    pub(crate) fn crown(&mut self, user_id: UserId) {
        if let Some(participant) = self.get_mut(user_id) {
            participant.status = ParticipantStatus::Winner;
        }
    }

    /// Check that seeds run 1..=N in order
    pub fn validate(&self) -> TournamentResult<()> {
        for (index, participant) in self.participants.iter().enumerate() {
            if participant.seed as usize != index + 1 {
                return Err(TournamentError::CorruptState(format!(
                    "participant {} holds seed {} at position {}",
                    participant.user_id,
                    participant.seed,
                    index + 1
                )));
            }

            if self.participants[..index]
                .iter()
                .any(|p| p.user_id == participant.user_id)
            {
                return Err(TournamentError::DuplicateParticipant(participant.user_id));
            }
        }
        Ok(())
    }

    fn get_mut(&mut self, user_id: UserId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    fn next_seed(&self) -> u32 {
        u32::try_from(self.participants.len() + 1).unwrap_or(u32::MAX)
    }

    fn reassign_seeds(&mut self) {
        for (index, participant) in self.participants.iter_mut().enumerate() {
            participant.seed = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn test_register_assigns_sequential_seeds() {
        let mut registry = Registry::new();
        assert_eq!(registry.register(10, 8).unwrap(), 1);
        assert_eq!(registry.register(20, 8).unwrap(), 2);
        assert_eq!(registry.register(30, 8).unwrap(), 3);

        assert_eq!(registry.by_seed(2).unwrap().user_id, 20);
        assert!(registry.by_seed(0).is_none());
        assert!(registry.by_seed(4).is_none());
    }

    #[test]
    fn test_register_rejects_duplicates_and_overflow() {
        let mut registry = Registry::new();
        registry.register(1, 2).unwrap();

        let err = registry.register(1, 2).unwrap_err();
        assert!(matches!(err, TournamentError::DuplicateParticipant(1)));

        registry.register(2, 2).unwrap();
        let err = registry.register(3, 2).unwrap_err();
        assert!(matches!(err, TournamentError::TournamentFull(2)));
    }

    #[test]
    fn test_withdraw_compacts_seeds() {
        let mut registry = Registry::from_user_ids(&[1, 2, 3, 4]).unwrap();
        registry.withdraw(2).unwrap();

        assert_eq!(registry.seeded_ids(), vec![1, 3, 4]);
        assert_eq!(registry.by_seed(2).unwrap().user_id, 3);
        assert!(registry.validate().is_ok());

        let err = registry.withdraw(99).unwrap_err();
        assert!(matches!(err, TournamentError::ParticipantNotFound(99)));
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let ids: Vec<UserId> = (1..=16).collect();
        let mut registry = Registry::from_user_ids(&ids).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        registry.shuffle(&mut rng);

        let shuffled: HashSet<UserId> = registry.seeded_ids().into_iter().collect();
        assert_eq!(shuffled, ids.iter().copied().collect());
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_shuffle_is_deterministic_for_a_seeded_rng() {
        let ids: Vec<UserId> = (1..=8).collect();
        let mut a = Registry::from_user_ids(&ids).unwrap();
        let mut b = Registry::from_user_ids(&ids).unwrap();

        a.shuffle(&mut StdRng::seed_from_u64(42));
        b.shuffle(&mut StdRng::seed_from_u64(42));
        assert_eq!(a.seeded_ids(), b.seeded_ids());
    }

    #[test]
    fn test_shuffle_handles_tiny_registries() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty = Registry::new();
        empty.shuffle(&mut rng);
        assert!(empty.is_empty());

        let mut single = Registry::from_user_ids(&[9]).unwrap();
        single.shuffle(&mut rng);
        assert_eq!(single.seeded_ids(), vec![9]);
        assert_eq!(single.get(9).unwrap().seed, 1);
    }

    #[test]
    fn test_eliminate_and_remaining() {
        let mut registry = Registry::from_user_ids(&[1, 2, 3]).unwrap();
        registry.eliminate(2, 1);
        assert_eq!(registry.remaining(), 2);
        assert_eq!(registry.get(2).unwrap().eliminated_in_round, Some(1));

        registry.reset_statuses();
        assert_eq!(registry.remaining(), 3);
    }
}
