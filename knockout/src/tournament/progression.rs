//! Round progression: completion detection and next-round generation.

use super::{
    errors::{TournamentError, TournamentResult},
    events::TournamentEvent,
    models::{Match, MatchId, MatchStatus, RoundOutcome, TournamentStatus, UserId},
    state::Tournament,
};

impl Tournament {
    /// A round is complete when it has matches and all of them are completed
    pub fn is_round_complete(&self, round: u32) -> bool {
        let mut matches = self.bracket.round(round).peekable();
        matches.peek().is_some() && matches.all(|m| m.status == MatchStatus::Completed)
    }

    /// Round that needs attention.
    ///
    /// The lowest round with a match being played or disputed wins, then the
    /// lowest round with a ready (both slots filled) pending match, then the stored
    /// round counter. Byes never count since they resolve themselves.
    ///
    /// A round is only generated once the one before it is complete, so open
    /// rounds form the tail of the bracket and settled rounds are never scanned.
    pub fn current_round(&self) -> u32 {
        let is_open = |m: &Match| !m.is_bye && m.status != MatchStatus::Completed;

        let lowest_open = self
            .bracket
            .round_numbers()
            .rev()
            .take_while(|&round| self.bracket.round(round).any(is_open))
            .last();
        let Some(lowest_open) = lowest_open else {
            return self.current_round;
        };

        let mut ready = None;
        for round in self.bracket.round_numbers().filter(|&r| r >= lowest_open) {
            for m in self.bracket.round(round).filter(|m| is_open(m)) {
                match m.status {
                    MatchStatus::InProgress | MatchStatus::Disputed => return round,
                    MatchStatus::Pending if m.is_ready() => {
                        ready.get_or_insert(round);
                    }
                    _ => {}
                }
            }
        }

        ready.unwrap_or(self.current_round)
    }

    /// Winners of a round in position order
    pub fn round_winners(&self, round: u32) -> Vec<UserId> {
        self.bracket.round(round).filter_map(|m| m.winner).collect()
    }

    /// Generate the next round from the winners of the current one.
    ///
    /// Fails with [`TournamentError::RoundIncomplete`] while any match of the
    /// current round is open. When a single winner remains the tournament is
    /// completed instead. Calling this on a completed tournament returns the
    /// terminal outcome again without touching state.
    pub fn advance_round(&mut self) -> TournamentResult<RoundOutcome> {
        match self.status {
            TournamentStatus::Registration => {
                return Err(TournamentError::InvalidState {
                    expected: TournamentStatus::Ongoing,
                    actual: self.status,
                });
            }
            TournamentStatus::Completed => {
                let winner = self.champion.ok_or_else(|| {
                    TournamentError::CorruptState(
                        "completed tournament without a champion".to_string(),
                    )
                })?;
                return Ok(RoundOutcome::Completed { winner });
            }
            TournamentStatus::Ongoing => {}
        }

        let outcome = self.advance_round_inner()?;
        self.touch();
        Ok(outcome)
    }

    /// Advance without the status gate or version bump; shared with auto advance
    pub(super) fn advance_round_inner(&mut self) -> TournamentResult<RoundOutcome> {
        let round = self.current_round;

        if !self.is_round_complete(round) {
            let pending = self
                .bracket
                .round(round)
                .filter(|m| m.status != MatchStatus::Completed)
                .count();
            return Err(TournamentError::RoundIncomplete { round, pending });
        }

        // (source match, winner) in position order
        let sources = self
            .bracket
            .round(round)
            .map(|m| {
                m.winner.map(|winner| (m.id.clone(), winner)).ok_or_else(|| {
                    TournamentError::CorruptState(format!("{} completed without a winner", m.id))
                })
            })
            .collect::<TournamentResult<Vec<(MatchId, UserId)>>>()?;

        if let [(_, winner)] = sources.as_slice() {
            let winner = *winner;
            self.complete_tournament(winner);
            return Ok(RoundOutcome::Completed { winner });
        }

        let next = round + 1;
        let regular = sources.len() / 2;

        for index in 1..=regular {
            self.bracket.insert(Match::new(
                Match::regular_id(next, index),
                next,
                position(index),
                None,
                None,
            ));
        }

        if sources.len() % 2 == 1
            && let Some((_, last)) = sources.last()
        {
            self.bracket.insert(Match::bye(
                Match::bye_id(next, 1),
                next,
                position(regular + 1),
                *last,
            ));
        }

        for (source_id, _) in &sources {
            let target = {
                let source = self.get_match(source_id)?;
                self.bracket
                    .at(next, source.next_position())
                    .map(|m| m.id.clone())
                    .ok_or_else(|| {
                        TournamentError::CorruptState(format!(
                            "no round {next} slot for {source_id}"
                        ))
                    })?
            };
            self.match_mut(source_id)?.next_match_id = Some(target);
            self.place_winner(source_id)?;
        }

        self.current_round = next;
        let matches: Vec<Match> = self.bracket.round(next).cloned().collect();
        self.events.push(TournamentEvent::RoundAdvanced {
            round: next,
            match_ids: matches.iter().map(|m| m.id.clone()).collect(),
        });

        log::info!(
            "Tournament {}: advanced to round {} ({} players, {} matches)",
            self.id,
            next,
            sources.len(),
            matches.len()
        );

        Ok(RoundOutcome::Advanced {
            round: next,
            matches,
        })
    }

    /// Copy a decided match's winner into the slot it feeds.
    ///
    /// Odd positions fill player1, even positions player2. A next match that ends
    /// up with both players is started (when auto start is on).
    pub(super) fn place_winner(&mut self, source_id: &str) -> TournamentResult<()> {
        let source = self.get_match(source_id)?;
        let (Some(next_id), Some(winner)) = (source.next_match_id.clone(), source.winner) else {
            return Ok(());
        };
        let first_slot = source.feeds_first_slot();

        let next = self.match_mut(&next_id)?;
        if next.is_bye || next.status != MatchStatus::Pending {
            return Ok(());
        }

        if first_slot {
            next.player1 = Some(winner);
        } else {
            next.player2 = Some(winner);
        }

        if next.is_ready() {
            self.activate(&next_id);
        }
        Ok(())
    }
}

fn position(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
