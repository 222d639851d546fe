//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use holdem_table::table::{SEAT_LIMIT, TableConfig};
use std::net::SocketAddr;

/// Default listen address for the WebSocket server
pub const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// The one table this server hosts
    pub table: TableConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_bind_override` - Optional metrics address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if an address doesn't parse or the table settings are invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr("SERVER_BIND")?.map_or_else(default_bind, Ok)?,
        };
        let metrics_bind = match metrics_bind_override {
            Some(addr) => Some(addr),
            None => parse_addr("METRICS_BIND")?,
        };

        let defaults = TableConfig::default();
        let table = TableConfig {
            name: std::env::var("TABLE_NAME").unwrap_or(defaults.name),
            max_players: parse_env_or("MAX_PLAYERS", defaults.max_players),
            starting_stack: parse_env_or("STARTING_STACK", defaults.starting_stack),
            small_blind: parse_env_or("SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("BIG_BLIND", defaults.big_blind),
            action_timeout_secs: parse_env_or("ACTION_TIMEOUT_SECS", defaults.action_timeout_secs),
            hand_end_delay_secs: parse_env_or("HAND_END_DELAY_SECS", defaults.hand_end_delay_secs),
            max_name_length: parse_env_or("MAX_NAME_LENGTH", defaults.max_name_length),
        };

        let config = ServerConfig {
            bind,
            metrics_bind,
            table,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table.small_blind == 0 {
            return Err(ConfigError::Invalid {
                var: "SMALL_BLIND".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.table.big_blind <= self.table.small_blind {
            return Err(ConfigError::Invalid {
                var: "BIG_BLIND".to_string(),
                reason: format!(
                    "Must be greater than small blind ({})",
                    self.table.small_blind
                ),
            });
        }

        if self.table.max_players < 2 || self.table.max_players > SEAT_LIMIT {
            return Err(ConfigError::Invalid {
                var: "MAX_PLAYERS".to_string(),
                reason: format!("Must be between 2 and {SEAT_LIMIT} (52-card deck)"),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: "Must differ from SERVER_BIND".to_string(),
            });
        }

        self.table.validate().map_err(|reason| ConfigError::Invalid {
            var: "table".to_string(),
            reason,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> Result<SocketAddr, ConfigError> {
    DEFAULT_BIND.parse().map_err(|_| ConfigError::MissingRequired {
        var: "SERVER_BIND".to_string(),
        hint: "Set an IP:PORT such as 0.0.0.0:6969".to_string(),
    })
}

/// A set but unparseable address is an error, not a silent default.
fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{value}' is not an IP:PORT address"),
            }),
        Err(_) => Ok(None),
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn config(table: TableConfig) -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            metrics_bind: None,
            table,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "SERVER_BIND".to_string(),
            hint: "Use IP:PORT".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SERVER_BIND"));
        assert!(msg.contains("Use IP:PORT"));
    }

    #[test]
    fn test_default_table_is_valid() {
        assert!(config(TableConfig::default()).validate().is_ok());
    }

    #[test]
    fn test_config_validation_blind_zero() {
        let err = config(TableConfig {
            small_blind: 0,
            ..Default::default()
        })
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == "SMALL_BLIND"));
    }

    #[test]
    fn test_config_validation_big_blind_too_small() {
        let err = config(TableConfig {
            small_blind: 20,
            big_blind: 10,
            ..Default::default()
        })
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == "BIG_BLIND"));
    }

    #[test]
    fn test_config_validation_seat_limit() {
        let err = config(TableConfig {
            max_players: SEAT_LIMIT + 1,
            ..Default::default()
        })
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == "MAX_PLAYERS"));
    }

    #[test]
    fn test_metrics_must_use_own_port() {
        let mut server = config(TableConfig::default());
        server.metrics_bind = Some(server.bind);
        assert!(server.validate().is_err());
    }

    #[test]
    fn test_overrides_win() {
        let bind: SocketAddr = "0.0.0.0:7000".parse().unwrap();
        let metrics: SocketAddr = "0.0.0.0:9100".parse().unwrap();
        let config = ServerConfig::from_env(Some(bind), Some(metrics)).unwrap();
        assert_eq!(config.bind, bind);
        assert_eq!(config.metrics_bind, Some(metrics));
    }
}
