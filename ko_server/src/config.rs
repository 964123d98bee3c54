//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use knockout::{TournamentConfig, delivery::DeliveryConfig};
use std::net::SocketAddr;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Upper bound for `TOURNAMENT_MAX_PARTICIPANTS`
pub const MAX_FIELD_SIZE: usize = 4096;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Defaults for newly created tournaments
    pub tournament_defaults: TournamentConfig,
    /// Event delivery configuration
    pub delivery: DeliveryConfig,
    /// Bearer token required for organizer routes (open when unset)
    pub admin_token: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `admin_token_override` - Optional admin token override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but unparsable
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        admin_token_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        // Bind address
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let raw =
                    std::env::var("SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
                raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("'{raw}' is not an IP:PORT address"),
                })?
            }
        };

        let defaults = TournamentConfig::default();
        let tournament_defaults = TournamentConfig {
            max_participants: parse_env_or(
                "TOURNAMENT_MAX_PARTICIPANTS",
                defaults.max_participants,
            ),
            shuffle_on_start: parse_env_or("TOURNAMENT_SHUFFLE_ON_START", defaults.shuffle_on_start),
            auto_start_matches: parse_env_or("TOURNAMENT_AUTO_START", defaults.auto_start_matches),
            auto_advance: parse_env_or("TOURNAMENT_AUTO_ADVANCE", defaults.auto_advance),
            ..defaults
        };

        let delivery_defaults = DeliveryConfig::default();
        let delivery = DeliveryConfig {
            max_attempts: parse_env_or("DELIVERY_MAX_ATTEMPTS", delivery_defaults.max_attempts),
            base_backoff_ms: parse_env_or("DELIVERY_BACKOFF_MS", delivery_defaults.base_backoff_ms),
            min_interval_ms: parse_env_or(
                "DELIVERY_MIN_INTERVAL_MS",
                delivery_defaults.min_interval_ms,
            ),
            ..delivery_defaults
        };

        let admin_token = admin_token_override
            .or_else(|| std::env::var("ADMIN_TOKEN").ok())
            .filter(|token| !token.is_empty());

        Ok(ServerConfig {
            bind,
            tournament_defaults,
            delivery,
            admin_token,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tournament_defaults.max_participants < 2 {
            return Err(ConfigError::Invalid {
                var: "TOURNAMENT_MAX_PARTICIPANTS".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if self.tournament_defaults.max_participants > MAX_FIELD_SIZE {
            return Err(ConfigError::Invalid {
                var: "TOURNAMENT_MAX_PARTICIPANTS".to_string(),
                reason: format!("Must be at most {MAX_FIELD_SIZE}"),
            });
        }

        if self.delivery.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "DELIVERY_MAX_ATTEMPTS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if let Some(token) = &self.admin_token
            && token.len() < 16
        {
            return Err(ConfigError::Invalid {
                var: "ADMIN_TOKEN".to_string(),
                reason: "Must be at least 16 characters".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
