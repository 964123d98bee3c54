//! Match result consensus protocol.
//!
//! Both participants of a match self-report the winner. Two agreeing reports
//! finalize the match, two conflicting reports move it to `Disputed`, where only an
//! admin override can decide it. Finalization records the result, knocks out the
//! loser and feeds the winner forward through `next_match_id`.

use super::{
    errors::{TournamentError, TournamentResult},
    events::TournamentEvent,
    models::{
        Match, MatchScores, MatchStatus, ReportOutcome, ResultReport, TournamentStatus, UserId,
    },
    state::Tournament,
};
use chrono::Utc;

impl Tournament {
    /// Start a pending match once both players are known.
    ///
    /// Only needed when `auto_start_matches` is off.
    pub fn start_match(&mut self, match_id: &str) -> TournamentResult<Match> {
        self.require_status(TournamentStatus::Ongoing)?;

        let m = self.get_match(match_id)?;
        if m.status != MatchStatus::Pending || m.is_bye {
            return Err(TournamentError::MatchNotInProgress {
                match_id: m.id.clone(),
                status: m.status,
            });
        }
        let (Some(player1), Some(player2)) = (m.player1, m.player2) else {
            return Err(TournamentError::MatchNotReady(m.id.clone()));
        };

        let m = self.match_mut(match_id)?;
        m.transition(MatchStatus::InProgress)?;
        let started = m.clone();

        self.events.push(TournamentEvent::MatchReady {
            match_id: started.id.clone(),
            round: started.round,
            player1,
            player2,
        });
        self.touch();
        Ok(started)
    }

    /// Record a participant's claim about who won a match
    pub fn report_result(
        &mut self,
        match_id: &str,
        reporter_id: UserId,
        claimed_winner_id: UserId,
    ) -> TournamentResult<ReportOutcome> {
        self.require_status(TournamentStatus::Ongoing)?;

        let m = self.get_match(match_id)?;
        match m.status {
            MatchStatus::InProgress => {}
            MatchStatus::Completed => {
                return Err(TournamentError::MatchAlreadyCompleted(m.id.clone()));
            }
            status => {
                return Err(TournamentError::MatchNotInProgress {
                    match_id: m.id.clone(),
                    status,
                });
            }
        }

        if !m.has_player(reporter_id) {
            return Err(TournamentError::NotAMatchParticipant {
                match_id: m.id.clone(),
                user_id: reporter_id,
            });
        }

        if !m.has_player(claimed_winner_id) {
            return Err(TournamentError::InvalidWinner {
                match_id: m.id.clone(),
                winner_id: claimed_winner_id,
            });
        }

        let m = self.match_mut(match_id)?;
        m.record_report(ResultReport::new(reporter_id, claimed_winner_id));

        let outcome = match m.result_reports.as_slice() {
            [first, second] if first.claimed_winner_id == second.claimed_winner_id => {
                let winner = first.claimed_winner_id;
                self.finalize(match_id, winner, None)?;
                ReportOutcome::Finalized { winner }
            }
            [_, _] => {
                m.transition(MatchStatus::Disputed)?;
                let reports = m.result_reports.clone();
                let round = m.round;
                self.events.push(TournamentEvent::MatchDisputed {
                    match_id: match_id.to_string(),
                    round,
                    reports: reports.clone(),
                });
                log::warn!(
                    "Tournament {}: match {} disputed, waiting for an admin",
                    self.id,
                    match_id
                );
                ReportOutcome::Disputed { reports }
            }
            _ => ReportOutcome::AwaitingConfirmation,
        };

        self.touch();
        Ok(outcome)
    }

    /// Admin override: decide a match regardless of the reports on file.
    ///
    /// Works on any match with both players seated that is not completed yet.
    /// Checking that `resolver_id` may act as an admin is left to the caller.
    pub fn resolve_dispute(
        &mut self,
        match_id: &str,
        winner_id: UserId,
        resolver_id: UserId,
    ) -> TournamentResult<Match> {
        self.require_status(TournamentStatus::Ongoing)?;

        let m = self.get_match(match_id)?;
        match m.status {
            MatchStatus::InProgress | MatchStatus::Disputed => {}
            MatchStatus::Pending if m.is_ready() && !m.is_bye => {}
            MatchStatus::Pending => return Err(TournamentError::MatchNotReady(m.id.clone())),
            MatchStatus::Completed => {
                return Err(TournamentError::MatchAlreadyCompleted(m.id.clone()));
            }
            MatchStatus::Cancelled => {
                return Err(TournamentError::MatchNotInProgress {
                    match_id: m.id.clone(),
                    status: m.status,
                });
            }
        }

        if !m.has_player(winner_id) {
            return Err(TournamentError::InvalidWinner {
                match_id: m.id.clone(),
                winner_id,
            });
        }

        let discarded_reports = m.result_reports.len();
        self.finalize(match_id, winner_id, Some(resolver_id))?;
        self.touch();

        log::info!(
            "Tournament {}: match {} resolved by {} in favour of {} ({} report(s) discarded)",
            self.id,
            match_id,
            resolver_id,
            winner_id,
            discarded_reports
        );

        Ok(self.get_match(match_id)?.clone())
    }

    /// Record the winner and push the consequences through the bracket
    fn finalize(
        &mut self,
        match_id: &str,
        winner: UserId,
        resolved_by: Option<UserId>,
    ) -> TournamentResult<()> {
        let m = self.match_mut(match_id)?;
        m.transition(MatchStatus::Completed)?;
        m.winner = Some(winner);
        m.scores = MatchScores::decided(m.player1 == Some(winner));
        m.completed_at = Some(Utc::now());
        m.result_reports.clear();
        if let Some(admin) = resolved_by {
            m.admin_resolved = true;
            m.resolved_by = Some(admin);
        }

        let round = m.round;
        let loser = m.loser();
        let admin_resolved = m.admin_resolved;
        let feeds_forward = m.next_match_id.is_some();

        if let Some(loser) = loser {
            self.registry.eliminate(loser, round);
        }
        self.events.push(TournamentEvent::MatchCompleted {
            match_id: match_id.to_string(),
            round,
            winner,
            loser,
            admin_resolved,
        });

        if feeds_forward {
            self.place_winner(match_id)?;
        } else if self.is_final(round) {
            self.complete_tournament(winner);
        } else if self.config.auto_advance
            && round == self.current_round
            && self.is_round_complete(round)
        {
            self.advance_round_inner()?;
        }

        Ok(())
    }

    /// A round holding a single real match is the final
    fn is_final(&self, round: u32) -> bool {
        let mut matches = self.bracket.round(round);
        matches!((matches.next(), matches.next()), (Some(m), None) if !m.is_bye)
    }
}
