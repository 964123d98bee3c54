//! Tournament actor: single writer for one tournament aggregate.

use super::messages::{Reply, TournamentMessage};
use crate::{
    store::TournamentStore,
    tournament::{
        EventEnvelope, Match, MatchId, ReportOutcome, RoundOutcome, Standing, Tournament,
        TournamentError, TournamentEvent, TournamentId, TournamentResult, TournamentSummary,
        UserId,
    },
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Inbox capacity per tournament
const INBOX_CAPACITY: usize = 100;

/// Tournament actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TournamentHandle {
    sender: mpsc::Sender<TournamentMessage>,
    tournament_id: TournamentId,
}

impl TournamentHandle {
    /// Create a new tournament handle
    pub fn new(sender: mpsc::Sender<TournamentMessage>, tournament_id: TournamentId) -> Self {
        Self {
            sender,
            tournament_id,
        }
    }

    /// Get tournament ID
    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    /// Send a message to the tournament
    pub async fn send(&self, message: TournamentMessage) -> TournamentResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TournamentError::ActorUnavailable(self.tournament_id))
    }

    /// Send a message and wait for the actor's reply
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> TournamentMessage,
    ) -> TournamentResult<T> {
        let (response, reply) = oneshot::channel();
        self.send(build(response)).await?;
        reply
            .await
            .map_err(|_| TournamentError::ActorUnavailable(self.tournament_id))
    }

    pub async fn register(&self, user_id: UserId) -> TournamentResult<u32> {
        self.request(|response| TournamentMessage::Register { user_id, response })
            .await?
    }

    pub async fn withdraw(&self, user_id: UserId) -> TournamentResult<()> {
        self.request(|response| TournamentMessage::Withdraw { user_id, response })
            .await?
    }

    pub async fn start(&self) -> TournamentResult<Vec<Match>> {
        self.request(|response| TournamentMessage::Start { response })
            .await?
    }

    pub async fn create_bracket(&self, participants: Vec<UserId>) -> TournamentResult<Vec<Match>> {
        self.request(|response| TournamentMessage::CreateBracket {
            participants,
            response,
        })
        .await?
    }

    pub async fn reseed(&self) -> TournamentResult<Vec<Match>> {
        self.request(|response| TournamentMessage::Reseed { response })
            .await?
    }

    pub async fn start_match(&self, match_id: impl Into<MatchId>) -> TournamentResult<Match> {
        let match_id = match_id.into();
        self.request(|response| TournamentMessage::StartMatch { match_id, response })
            .await?
    }

    pub async fn report_result(
        &self,
        match_id: impl Into<MatchId>,
        reporter_id: UserId,
        claimed_winner_id: UserId,
    ) -> TournamentResult<ReportOutcome> {
        let match_id = match_id.into();
        self.request(|response| TournamentMessage::ReportResult {
            match_id,
            reporter_id,
            claimed_winner_id,
            response,
        })
        .await?
    }

    pub async fn resolve_dispute(
        &self,
        match_id: impl Into<MatchId>,
        winner_id: UserId,
        resolver_id: UserId,
    ) -> TournamentResult<Match> {
        let match_id = match_id.into();
        self.request(|response| TournamentMessage::ResolveDispute {
            match_id,
            winner_id,
            resolver_id,
            response,
        })
        .await?
    }

    pub async fn advance_round(&self) -> TournamentResult<RoundOutcome> {
        self.request(|response| TournamentMessage::AdvanceRound { response })
            .await?
    }

    pub async fn summary(&self) -> TournamentResult<TournamentSummary> {
        self.request(|response| TournamentMessage::GetSummary { response })
            .await
    }

    pub async fn snapshot(&self) -> TournamentResult<Tournament> {
        self.request(|response| TournamentMessage::GetSnapshot { response })
            .await
    }

    pub async fn standings(&self) -> TournamentResult<Vec<Standing>> {
        self.request(|response| TournamentMessage::GetStandings { response })
            .await
    }

    /// Copy of a single match
    pub async fn get_match(&self, match_id: impl Into<MatchId>) -> TournamentResult<Match> {
        let match_id = match_id.into();
        self.request(|response| TournamentMessage::GetMatch { match_id, response })
            .await?
    }

    /// Matches of one round in position order, or every match when `round` is `None`
    pub async fn matches(&self, round: Option<u32>) -> TournamentResult<Vec<Match>> {
        self.request(|response| TournamentMessage::GetMatches { round, response })
            .await
    }

    /// Stop the actor; later requests fail with `ActorUnavailable`
    pub async fn close(&self) -> TournamentResult<()> {
        self.request(|response| TournamentMessage::Close { response })
            .await
    }
}

/// Tournament actor owning one aggregate.
///
/// Messages are handled one at a time, so two reports for the same match can
/// never interleave. Each mutation runs on a draft copy; the draft is persisted
/// with a version check and only then replaces the live state, after which its
/// events are published.
pub struct TournamentActor {
    /// Tournament ID
    id: TournamentId,

    /// Live aggregate (last persisted state)
    state: Tournament,

    /// Message inbox
    inbox: mpsc::Receiver<TournamentMessage>,

    /// Persistence collaborator
    store: Arc<dyn TournamentStore>,

    /// Outbound event channel (None once the receiver is gone)
    events: Option<mpsc::Sender<EventEnvelope>>,

    /// Is actor closed
    is_closed: bool,
}

impl TournamentActor {
    /// Create a new tournament actor
    ///
    /// # Arguments
    ///
    /// * `state` - Tournament aggregate, already persisted
    /// * `store` - Store used for compare-and-swap saves
    /// * `events` - Channel receiving drained domain events
    ///
    /// # Returns
    ///
    /// * `(TournamentActor, TournamentHandle)` - Actor and handle for sending messages
    pub fn new(
        state: Tournament,
        store: Arc<dyn TournamentStore>,
        events: Option<mpsc::Sender<EventEnvelope>>,
    ) -> (Self, TournamentHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let id = state.id();

        let actor = Self {
            id,
            state,
            inbox,
            store,
            events,
            is_closed: false,
        };

        (actor, TournamentHandle::new(sender, id))
    }

    /// Run the tournament actor event loop
    pub async fn run(mut self) {
        log::info!("Tournament {} '{}' actor starting", self.id, self.state.name());

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;

            if self.is_closed {
                break;
            }
        }

        log::info!("Tournament {} '{}' actor stopped", self.id, self.state.name());
    }

    /// Handle a tournament message
    async fn handle_message(&mut self, message: TournamentMessage) {
        match message {
            TournamentMessage::Register { user_id, response } => {
                let result = self.apply(|t| t.register_participant(user_id)).await;
                reply(response, result);
            }

            TournamentMessage::Withdraw { user_id, response } => {
                let result = self.apply(|t| t.withdraw_participant(user_id)).await;
                reply(response, result);
            }

            TournamentMessage::Start { response } => {
                let result = self.apply(Tournament::start).await;
                reply(response, result);
            }

            TournamentMessage::CreateBracket {
                participants,
                response,
            } => {
                let result = self.apply(|t| t.create_bracket(&participants)).await;
                reply(response, result);
            }

            TournamentMessage::Reseed { response } => {
                let result = self.apply(Tournament::reseed).await;
                reply(response, result);
            }

            TournamentMessage::StartMatch { match_id, response } => {
                let result = self.apply(|t| t.start_match(&match_id)).await;
                reply(response, result);
            }

            TournamentMessage::ReportResult {
                match_id,
                reporter_id,
                claimed_winner_id,
                response,
            } => {
                let result = self
                    .apply(|t| t.report_result(&match_id, reporter_id, claimed_winner_id))
                    .await;
                reply(response, result);
            }

            TournamentMessage::ResolveDispute {
                match_id,
                winner_id,
                resolver_id,
                response,
            } => {
                let result = self
                    .apply(|t| t.resolve_dispute(&match_id, winner_id, resolver_id))
                    .await;
                reply(response, result);
            }

            TournamentMessage::AdvanceRound { response } => {
                let result = self.apply(Tournament::advance_round).await;
                reply(response, result);
            }

            TournamentMessage::GetSummary { response } => {
                let _ = response.send(self.state.summary());
            }

            TournamentMessage::GetSnapshot { response } => {
                let _ = response.send(self.state.clone());
            }

            TournamentMessage::GetStandings { response } => {
                let _ = response.send(self.state.standings());
            }

            TournamentMessage::GetMatch { match_id, response } => {
                reply(response, self.state.get_match(&match_id).cloned());
            }

            TournamentMessage::GetMatches { round, response } => {
                let matches = match round {
                    Some(round) => self
                        .state
                        .matches_in_round(round)
                        .into_iter()
                        .cloned()
                        .collect(),
                    None => self.state.bracket().iter().cloned().collect(),
                };
                let _ = response.send(matches);
            }

            TournamentMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    /// Run a mutation on a draft, persist it, then commit and publish
    async fn apply<T>(
        &mut self,
        operation: impl FnOnce(&mut Tournament) -> TournamentResult<T>,
    ) -> TournamentResult<T> {
        let mut draft = self.state.clone();
        let loaded_version = draft.version();
        let value = operation(&mut draft)?;

        if draft.version() != loaded_version {
            match self.store.save(&draft, Some(loaded_version)).await {
                Ok(()) => {}
                Err(e @ TournamentError::VersionConflict { .. }) => {
                    self.resync().await;
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }

        let events = draft.drain_events();
        self.state = draft;
        self.publish(events);
        Ok(value)
    }

    /// Another writer moved the stored version; adopt the stored aggregate
    async fn resync(&mut self) {
        let stored = match self.store.load(self.id).await {
            Ok(stored) => stored,
            Err(e) => {
                log::error!("Tournament {}: reload after conflict failed: {}", self.id, e);
                return;
            }
        };

        if let Err(e) = stored.validate() {
            log::error!(
                "Tournament {}: stored version {} is invalid, keeping version {}: {}",
                self.id,
                stored.version(),
                self.state.version(),
                e
            );
            return;
        }

        log::warn!(
            "Tournament {}: version conflict, reloaded version {} (was {})",
            self.id,
            stored.version(),
            self.state.version()
        );
        self.state = stored;
    }

    /// Hand drained events to the delivery channel without blocking
    fn publish(&mut self, events: Vec<TournamentEvent>) {
        if events.is_empty() {
            return;
        }
        log::debug!("Tournament {} generated {} events", self.id, events.len());

        let Some(sender) = &self.events else {
            return;
        };

        let mut closed = false;
        for event in events {
            match sender.try_send(EventEnvelope::new(self.id, event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(envelope)) => {
                    log::warn!(
                        "Tournament {}: event channel full, dropping {}",
                        self.id,
                        envelope.event
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Tournament {}: event channel closed", self.id);
                    closed = true;
                    break;
                }
            }
        }

        if closed {
            self.events = None;
        }
    }
}

fn reply<T>(response: Reply<T>, result: TournamentResult<T>) {
    let _ = response.send(result);
}
