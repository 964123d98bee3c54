//! Persistence boundary for tournament aggregates.
//!
//! Saves are compare-and-swap on the aggregate `version`: a writer states the
//! version it loaded and the save fails with
//! [`TournamentError::VersionConflict`] if somebody else got there first.

use crate::tournament::{Tournament, TournamentError, TournamentId, TournamentResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Atomic load/save of tournament aggregates
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Load a tournament
    async fn load(&self, id: TournamentId) -> TournamentResult<Tournament>;

    /// Store `tournament`.
    ///
    /// `expected_version` is the version the caller loaded, `None` for a new
    /// tournament.
    async fn save(
        &self,
        tournament: &Tournament,
        expected_version: Option<u64>,
    ) -> TournamentResult<()>;

    /// IDs of all stored tournaments, ascending
    async fn list_ids(&self) -> TournamentResult<Vec<TournamentId>>;
}

#[derive(Debug, Clone)]
struct Snapshot {
    version: u64,
    json: String,
}

/// In-memory store keeping JSON snapshots
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<TournamentId, Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tournaments
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn load(&self, id: TournamentId) -> TournamentResult<Tournament> {
        let snapshots = self.snapshots.read().await;
        let snapshot = snapshots
            .get(&id)
            .ok_or(TournamentError::TournamentNotFound(id))?;
        Ok(serde_json::from_str(&snapshot.json)?)
    }

    async fn save(
        &self,
        tournament: &Tournament,
        expected_version: Option<u64>,
    ) -> TournamentResult<()> {
        let json = serde_json::to_string(tournament)?;
        let mut snapshots = self.snapshots.write().await;

        let stored = snapshots.get(&tournament.id()).map(|s| s.version);
        match (expected_version, stored) {
            (None, None) => {}
            (Some(expected), Some(actual)) if expected == actual => {}
            (Some(_), None) => return Err(TournamentError::TournamentNotFound(tournament.id())),
            (expected, Some(actual)) => {
                return Err(TournamentError::VersionConflict {
                    expected: expected.unwrap_or(0),
                    actual,
                });
            }
        }

        snapshots.insert(
            tournament.id(),
            Snapshot {
                version: tournament.version(),
                json,
            },
        );
        log::debug!(
            "Stored tournament {} at version {}",
            tournament.id(),
            tournament.version()
        );
        Ok(())
    }

    async fn list_ids(&self) -> TournamentResult<Vec<TournamentId>> {
        let mut ids: Vec<TournamentId> = self.snapshots.read().await.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
