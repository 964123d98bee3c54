//! Structured logging configuration.
//!
//! The engine crate logs through the `log` facade; `tracing-subscriber`'s
//! default `tracing-log` feature forwards those records into the same output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,hyper=warn,tower_http=warn";

/// Build the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use ko_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log an organizer action that bypassed or failed the admin gate
pub fn log_admin_event(action: &str, authorized: bool, request_id: Option<&str>) {
    if authorized {
        tracing::info!(action = action, request_id = request_id, "ADMIN: {}", action);
    } else {
        tracing::warn!(
            action = action,
            request_id = request_id,
            "ADMIN: rejected unauthorized {}",
            action
        );
    }
}
