//! Out-of-band delivery of tournament events.
//!
//! Actors push [`EventEnvelope`](crate::tournament::EventEnvelope)s onto a
//! bounded channel; the [`EventDispatcher`] drains it and hands each envelope to
//! an [`EventSink`] (chat bridge, webhook, log) with retries and a minimum
//! spacing between deliveries. A failing sink never blocks or rolls back
//! bracket state.

pub mod dispatcher;
pub mod sink;

pub use dispatcher::{DeliveryConfig, DispatchStats, EventDispatcher};
pub use sink::{DeliveryError, EventSink, LogSink};
