//! Retrying, rate-limited event dispatcher.

use super::sink::{DeliveryError, EventSink};
use crate::tournament::EventEnvelope;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    time::{Instant, sleep, sleep_until},
};

/// Delivery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Attempts per event, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry, doubled for each further retry
    pub base_backoff_ms: u64,

    /// Minimum spacing between two deliveries
    pub min_interval_ms: u64,

    /// Capacity of the event channel feeding the dispatcher
    pub channel_capacity: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 200,
            min_interval_ms: 50,
            channel_capacity: 256,
        }
    }
}

impl DeliveryConfig {
    /// Backoff before retry number `retry` (1-based); the exponent is capped at 5
    pub fn backoff(&self, retry: u32) -> Duration {
        let multiplier = 2u64.pow(retry.saturating_sub(1).min(5));
        Duration::from_millis(self.base_backoff_ms.saturating_mul(multiplier))
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Counters reported when the dispatcher stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub delivered: u64,
    pub retries: u64,
    pub dropped: u64,
}

/// Drains the event channel into a sink
pub struct EventDispatcher {
    sink: Arc<dyn EventSink>,
    config: DeliveryConfig,
    inbox: mpsc::Receiver<EventEnvelope>,
    stats: DispatchStats,
}

impl EventDispatcher {
    /// Create a dispatcher and the sender actors publish into
    pub fn new(
        sink: Arc<dyn EventSink>,
        config: DeliveryConfig,
    ) -> (Self, mpsc::Sender<EventEnvelope>) {
        let (sender, inbox) = mpsc::channel(config.channel_capacity.max(1));
        let dispatcher = Self {
            sink,
            config,
            inbox,
            stats: DispatchStats::default(),
        };
        (dispatcher, sender)
    }

    /// Deliver events until every sender is dropped
    pub async fn run(mut self) -> DispatchStats {
        log::info!("Event dispatcher starting");
        let mut last_delivery: Option<Instant> = None;

        while let Some(envelope) = self.inbox.recv().await {
            if let Some(last) = last_delivery {
                sleep_until(last + self.config.min_interval()).await;
            }

            self.deliver(&envelope).await;
            last_delivery = Some(Instant::now());
        }

        log::info!(
            "Event dispatcher stopped: {} delivered, {} retries, {} dropped",
            self.stats.delivered,
            self.stats.retries,
            self.stats.dropped
        );
        self.stats
    }

    async fn deliver(&mut self, envelope: &EventEnvelope) {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.sink.deliver(envelope).await {
                Ok(()) => {
                    self.stats.delivered += 1;
                    return;
                }
                Err(DeliveryError::Unavailable(reason)) if attempt < max_attempts => {
                    let delay = self.config.backoff(attempt);
                    log::debug!(
                        "Delivery of {} failed (attempt {}/{}): {}, retrying in {:?}",
                        envelope.id,
                        attempt,
                        max_attempts,
                        reason,
                        delay
                    );
                    self.stats.retries += 1;
                    attempt += 1;
                    sleep(delay).await;
                }
                Err(e) => {
                    log::error!(
                        "Dropping event {} for tournament {} after {} attempt(s): {}",
                        envelope.id,
                        envelope.tournament_id,
                        attempt,
                        e
                    );
                    self.stats.dropped += 1;
                    return;
                }
            }
        }
    }
}
