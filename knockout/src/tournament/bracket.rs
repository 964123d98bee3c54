//! Bracket builder and match arena.
//!
//! Matches are stored by ID with a per-round index ordered by position, so
//! lookups, round scans and forward-link resolution never walk the whole bracket.

use super::models::{Match, MatchId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Match arena indexed by ID and by (round, position)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Match>", into = "Vec<Match>")]
pub struct Bracket {
    matches: HashMap<MatchId, Match>,
    rounds: BTreeMap<u32, BTreeMap<u32, MatchId>>,
}

impl From<Vec<Match>> for Bracket {
    fn from(matches: Vec<Match>) -> Self {
        let mut bracket = Self::default();
        for m in matches {
            bracket.insert(m);
        }
        bracket
    }
}

impl From<Bracket> for Vec<Match> {
    fn from(mut bracket: Bracket) -> Self {
        let rounds = std::mem::take(&mut bracket.rounds);
        rounds
            .into_values()
            .flat_map(|positions| positions.into_values())
            .filter_map(|id| bracket.matches.remove(&id))
            .collect()
    }
}

impl Bracket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match; a match already occupying the same ID or slot is replaced
    pub fn insert(&mut self, m: Match) {
        if let Some(previous) = self
            .rounds
            .get(&m.round)
            .and_then(|positions| positions.get(&m.position))
            .cloned()
        {
            self.matches.remove(&previous);
        }

        self.rounds
            .entry(m.round)
            .or_default()
            .insert(m.position, m.id.clone());
        self.matches.insert(m.id.clone(), m);
    }

    pub fn get(&self, id: &str) -> Option<&Match> {
        self.matches.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Match> {
        self.matches.get_mut(id)
    }

    /// Match at a given slot
    pub fn at(&self, round: u32, position: u32) -> Option<&Match> {
        self.rounds
            .get(&round)
            .and_then(|positions| positions.get(&position))
            .and_then(|id| self.matches.get(id))
    }

    /// Matches of a round in position order
    pub fn round(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.rounds
            .get(&round)
            .into_iter()
            .flat_map(|positions| positions.values())
            .filter_map(|id| self.matches.get(id))
    }

    /// All matches in round, then position order
    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.rounds
            .values()
            .flat_map(|positions| positions.values())
            .filter_map(|id| self.matches.get(id))
    }

    /// Generated round numbers, ascending
    pub fn round_numbers(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.rounds.keys().copied()
    }

    /// Highest generated round
    pub fn last_round(&self) -> Option<u32> {
        self.rounds.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Drop every match, returning the discarded IDs in bracket order
    pub fn clear(&mut self) -> Vec<MatchId> {
        let discarded = self.iter().map(|m| m.id.clone()).collect();
        self.matches.clear();
        self.rounds.clear();
        discarded
    }
}

/// Pair players sequentially into one round.
///
/// `players[0]` meets `players[1]`, `players[2]` meets `players[3]` and so on.
/// A leftover player gets a bye, created already resolved and placed after the
/// regular matches.
pub fn build_round(round: u32, players: &[UserId]) -> Vec<Match> {
    let pairs = players.chunks_exact(2);
    let leftover = pairs.remainder();
    let mut matches = Vec::with_capacity(players.len().div_ceil(2));

    for (index, pair) in pairs.enumerate() {
        matches.push(Match::new(
            Match::regular_id(round, index + 1),
            round,
            slot(matches.len()),
            Some(pair[0]),
            Some(pair[1]),
        ));
    }

    for (index, &player) in leftover.iter().enumerate() {
        matches.push(Match::bye(
            Match::bye_id(round, index + 1),
            round,
            slot(matches.len()),
            player,
        ));
    }

    matches
}

fn slot(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}
