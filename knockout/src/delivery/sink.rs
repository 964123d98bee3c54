//! Event sinks.

use crate::tournament::EventEnvelope;
use async_trait::async_trait;
use thiserror::Error;

/// Delivery failures reported by a sink
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The sink refused the event; retrying will not help
    #[error("Event rejected: {0}")]
    Rejected(String),

    /// Transient failure, worth retrying
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for tournament events
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one envelope
    async fn deliver(&self, envelope: &EventEnvelope) -> Result<(), DeliveryError>;
}

/// Sink writing every event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn deliver(&self, envelope: &EventEnvelope) -> Result<(), DeliveryError> {
        log::info!(
            "Tournament {}: {} [{}]",
            envelope.tournament_id,
            envelope.event,
            envelope.id
        );

        if log::log_enabled!(log::Level::Trace) {
            let json = serde_json::to_string(envelope)
                .map_err(|e| DeliveryError::Rejected(e.to_string()))?;
            log::trace!("{}", json);
        }

        Ok(())
    }
}
