//! Tournament manager for spawning and managing tournament actors.

use super::actor::{TournamentActor, TournamentHandle};
use crate::{
    store::TournamentStore,
    tournament::{
        EventEnvelope, Tournament, TournamentConfig, TournamentError, TournamentId,
        TournamentResult, TournamentSummary,
    },
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

/// Tournament manager for managing multiple tournament instances
pub struct TournamentManager {
    /// Persistence collaborator shared by every actor
    store: Arc<dyn TournamentStore>,

    /// Event channel handed to every actor
    events: Option<mpsc::Sender<EventEnvelope>>,

    /// Active tournament handles
    tournaments: Arc<RwLock<HashMap<TournamentId, TournamentHandle>>>,

    /// Next tournament ID
    next_tournament_id: Arc<RwLock<TournamentId>>,
}

impl TournamentManager {
    /// Create a new tournament manager
    ///
    /// # Arguments
    ///
    /// * `store` - Tournament store
    /// * `events` - Channel receiving domain events of every tournament
    pub fn new(
        store: Arc<dyn TournamentStore>,
        events: Option<mpsc::Sender<EventEnvelope>>,
    ) -> Self {
        Self {
            store,
            events,
            tournaments: Arc::new(RwLock::new(HashMap::new())),
            next_tournament_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Load stored tournaments and spawn actors for them
    ///
    /// Aggregates failing validation are skipped and logged.
    ///
    /// # Returns
    ///
    /// * `TournamentResult<usize>` - Number of tournaments loaded
    pub async fn load_existing_tournaments(&self) -> TournamentResult<usize> {
        let ids = self.store.list_ids().await?;
        let mut max_id = 0;
        let mut loaded_count = 0;

        for id in ids {
            max_id = max_id.max(id);

            let tournament = match self.store.load(id).await {
                Ok(tournament) => tournament,
                Err(e) => {
                    log::error!("Failed to load tournament {}: {}", id, e);
                    continue;
                }
            };

            if let Err(e) = tournament.validate() {
                log::error!("Tournament {} failed validation, not loading: {}", id, e);
                continue;
            }

            self.spawn(tournament).await;
            log::info!("Loaded and spawned existing tournament {}", id);
            loaded_count += 1;
        }

        let mut next_id = self.next_tournament_id.write().await;
        *next_id = (*next_id).max(max_id + 1);
        drop(next_id);

        Ok(loaded_count)
    }

    /// Create, persist and spawn a new tournament
    ///
    /// # Arguments
    ///
    /// * `name` - Display name
    /// * `config` - Tournament configuration
    ///
    /// # Returns
    ///
    /// * `TournamentResult<TournamentId>` - ID of the new tournament
    pub async fn create_tournament(
        &self,
        name: impl Into<String>,
        config: TournamentConfig,
    ) -> TournamentResult<TournamentId> {
        config.validate()?;

        let mut next_id = self.next_tournament_id.write().await;
        let tournament_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let tournament = Tournament::new(tournament_id, name, config)?;
        self.store.save(&tournament, None).await?;
        self.spawn(tournament).await;

        log::info!("Created tournament {}", tournament_id);
        Ok(tournament_id)
    }

    /// Get handle for a tournament
    pub async fn get_tournament(&self, id: TournamentId) -> TournamentResult<TournamentHandle> {
        self.tournaments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    /// Summaries of every running tournament, ordered by ID
    pub async fn list_tournaments(&self) -> Vec<TournamentSummary> {
        let handles: Vec<TournamentHandle> =
            self.tournaments.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.summary().await {
                Ok(summary) => summaries.push(summary),
                Err(e) => log::warn!(
                    "Skipping tournament {} in listing: {}",
                    handle.tournament_id(),
                    e
                ),
            }
        }

        summaries.sort_by_key(|s| s.id);
        summaries
    }

    /// Stop a tournament's actor; its stored state is kept
    pub async fn close_tournament(&self, id: TournamentId) -> TournamentResult<()> {
        let handle = self
            .tournaments
            .write()
            .await
            .remove(&id)
            .ok_or(TournamentError::TournamentNotFound(id))?;

        handle.close().await?;
        log::info!("Closed tournament {}", id);
        Ok(())
    }

    /// Number of running tournaments
    pub async fn tournament_count(&self) -> usize {
        self.tournaments.read().await.len()
    }

    async fn spawn(&self, tournament: Tournament) {
        let id = tournament.id();
        let (actor, handle) =
            TournamentActor::new(tournament, self.store.clone(), self.events.clone());

        let mut tournaments = self.tournaments.write().await;
        tournaments.insert(id, handle);
        drop(tournaments);

        tokio::spawn(async move {
            actor.run().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::MemoryStore,
        tournament::{ReportOutcome, TournamentEvent, TournamentStatus},
    };

    fn unshuffled() -> TournamentConfig {
        TournamentConfig {
            shuffle_on_start: false,
            ..TournamentConfig::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let manager = TournamentManager::new(Arc::new(MemoryStore::new()), None);
        assert_eq!(manager.create_tournament("A", unshuffled()).await.unwrap(), 1);
        assert_eq!(manager.create_tournament("B", unshuffled()).await.unwrap(), 2);
        assert_eq!(manager.tournament_count().await, 2);

        let summaries = manager.list_tournaments().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "A");
    }

    #[tokio::test]
    async fn test_invalid_config_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let manager = TournamentManager::new(store.clone(), None);
        let config = TournamentConfig {
            min_participants: 0,
            ..TournamentConfig::default()
        };

        let err = manager.create_tournament("Bad", config).await.unwrap_err();
        assert!(matches!(err, TournamentError::InvalidConfig(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let store = Arc::new(MemoryStore::new());
        let manager = TournamentManager::new(store.clone(), None);
        let id = manager.create_tournament("Persisted", unshuffled()).await.unwrap();
        let handle = manager.get_tournament(id).await.unwrap();

        handle.create_bracket(vec![1, 2]).await.unwrap();
        handle.report_result("r1m1", 1, 1).await.unwrap();

        let stored = store.load(id).await.unwrap();
        assert_eq!(stored.status(), TournamentStatus::Ongoing);
        assert_eq!(stored.get_match("r1m1").unwrap().result_reports.len(), 1);
        assert_eq!(stored.version(), handle.summary().await.unwrap().version);
    }

    #[tokio::test]
    async fn test_rejected_operation_is_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        let manager = TournamentManager::new(store.clone(), None);
        let id = manager.create_tournament("Strict", unshuffled()).await.unwrap();
        let handle = manager.get_tournament(id).await.unwrap();

        let err = handle.start().await.unwrap_err();
        assert!(matches!(err, TournamentError::NotEnoughParticipants { .. }));
        assert_eq!(store.load(id).await.unwrap().version(), 0);
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let (sender, mut receiver) = mpsc::channel(16);
        let manager = TournamentManager::new(Arc::new(MemoryStore::new()), Some(sender));
        let id = manager.create_tournament("Loud", unshuffled()).await.unwrap();
        let handle = manager.get_tournament(id).await.unwrap();

        handle.create_bracket(vec![1, 2]).await.unwrap();
        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.tournament_id, id);
        assert!(matches!(envelope.event, TournamentEvent::MatchReady { .. }));

        handle.report_result("r1m1", 1, 2).await.unwrap();
        let outcome = handle.report_result("r1m1", 2, 2).await.unwrap();
        assert_eq!(outcome, ReportOutcome::Finalized { winner: 2 });

        let completed = receiver.recv().await.unwrap();
        assert!(matches!(
            completed.event,
            TournamentEvent::MatchCompleted { winner: 2, .. }
        ));
        let champion = receiver.recv().await.unwrap();
        assert!(matches!(
            champion.event,
            TournamentEvent::TournamentCompleted { winner: 2 }
        ));
    }

    #[tokio::test]
    async fn test_close_and_reload() {
        let store = Arc::new(MemoryStore::new());
        let manager = TournamentManager::new(store.clone(), None);
        let id = manager.create_tournament("Reload", unshuffled()).await.unwrap();
        manager
            .get_tournament(id)
            .await
            .unwrap()
            .register(5)
            .await
            .unwrap();

        manager.close_tournament(id).await.unwrap();
        assert!(matches!(
            manager.get_tournament(id).await.unwrap_err(),
            TournamentError::TournamentNotFound(_)
        ));

        let fresh = TournamentManager::new(store, None);
        assert_eq!(fresh.load_existing_tournaments().await.unwrap(), 1);
        let summary = fresh.get_tournament(id).await.unwrap().summary().await.unwrap();
        assert_eq!(summary.participant_count, 1);

        // IDs continue after the loaded ones
        assert_eq!(fresh.create_tournament("Next", unshuffled()).await.unwrap(), id + 1);
    }
}
