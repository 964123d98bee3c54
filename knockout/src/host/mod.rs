//! Tournament hosting with the async actor model.
//!
//! This module implements:
//! - TournamentActor: single writer owning one tournament aggregate
//! - TournamentManager: spawns actors and tracks their handles
//! - Message-based communication with tokio channels
//!
//! ## Architecture
//!
//! Each tournament runs in its own Tokio task with an mpsc inbox, so mutations
//! of one tournament are applied strictly in arrival order. Every mutation is
//! saved through the [`TournamentStore`](crate::store::TournamentStore) with a
//! version check before it becomes visible, and the events it produced are
//! pushed onto a bounded channel for the delivery layer.
//!
//! ## Example
//!
//! ```
//! use knockout::{host::TournamentManager, store::MemoryStore, tournament::TournamentConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = TournamentManager::new(Arc::new(MemoryStore::new()), None);
//! let id = manager
//!     .create_tournament("Friday Cup", TournamentConfig::default())
//!     .await?;
//!
//! let cup = manager.get_tournament(id).await?;
//! cup.create_bracket(vec![1, 2, 3, 4]).await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod manager;
pub mod messages;

pub use actor::{TournamentActor, TournamentHandle};
pub use manager::TournamentManager;
pub use messages::TournamentMessage;
