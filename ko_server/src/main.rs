//! Knockout tournament server.
//!
//! Hosts one TournamentActor per tournament behind a TournamentManager and
//! forwards domain events to a delivery dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use knockout::{
    delivery::{EventDispatcher, LogSink},
    host::TournamentManager,
    store::MemoryStore,
};
use ko_server::{api, config::ServerConfig, logging};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run a knockout tournament server

USAGE:
  ko_server [OPTIONS]

OPTIONS:
  --bind         IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --admin-token  TOKEN     Bearer token for organizer routes  [default: env ADMIN_TOKEN]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                   Server bind address (e.g., 0.0.0.0:8080)
  ADMIN_TOKEN                   Organizer token, at least 16 characters
  TOURNAMENT_MAX_PARTICIPANTS   Default field size limit
  TOURNAMENT_SHUFFLE_ON_START   Shuffle seeds when the bracket is built
  TOURNAMENT_AUTO_START         Start matches once both players are known
  TOURNAMENT_AUTO_ADVANCE       Advance rounds automatically
  DELIVERY_MAX_ATTEMPTS         Event delivery attempts
  DELIVERY_BACKOFF_MS           First retry delay
  DELIVERY_MIN_INTERVAL_MS      Minimum spacing between deliveries
";

struct Args {
    bind: Option<SocketAddr>,
    admin_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        admin_token: pargs.opt_value_from_str("--admin-token")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.admin_token)?;
    config.validate()?;
    info!("Starting knockout server at {}", config.bind);
    if config.admin_token.is_none() {
        log::warn!("No admin token configured, organizer routes are open");
    }

    // Event delivery
    let (dispatcher, events) = EventDispatcher::new(Arc::new(LogSink), config.delivery.clone());
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let manager = Arc::new(TournamentManager::new(
        Arc::new(MemoryStore::new()),
        Some(events),
    ));
    let loaded = manager.load_existing_tournaments().await?;
    info!("Server ready with {} tournament(s)", loaded);

    let api_state = api::AppState {
        manager: manager.clone(),
        defaults: config.tournament_defaults.clone(),
        admin_token: config.admin_token.as_deref().map(Arc::from),
    };
    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    // Dropping the manager closes every actor's event sender
    drop(manager);
    let stats = dispatcher_task.await?;
    info!(
        "Delivered {} event(s), {} retries, {} dropped",
        stats.delivered, stats.retries, stats.dropped
    );

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
