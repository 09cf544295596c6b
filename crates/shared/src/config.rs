//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Ledger behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Authentication transport settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as loaded from config sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key shared with the identity provider.
    pub secret: String,
    /// Access token expiration in seconds (used by issuance helpers only).
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How many times a balance or quantity update re-reads after losing a
    /// compare-and-swap race before giving up.
    #[serde(default = "default_max_update_attempts")]
    pub max_update_attempts: u32,
    /// Interval between history reconciliation sweeps.
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
    /// Whether removing a member also revokes their organization claim and
    /// owner/admin roles.
    #[serde(default)]
    pub revoke_grants_on_removal: bool,
}

fn default_max_update_attempts() -> u32 {
    3
}

fn default_reconcile_interval() -> u64 {
    60
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: default_max_update_attempts(),
            reconcile_interval_secs: default_reconcile_interval(),
            revoke_grants_on_removal: false,
        }
    }
}

/// Authentication transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Cookie carrying the access token for browser clients.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_cookie_name() -> String {
    "starledger_token".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STARLEDGER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("STARLEDGER__DATABASE__URL", Some("sqlite::memory:")),
                ("STARLEDGER__JWT__SECRET", Some("env-secret")),
                ("STARLEDGER__SERVER__PORT", Some("9090")),
                ("STARLEDGER__LEDGER__MAX_UPDATE_ATTEMPTS", Some("5")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.jwt.secret, "env-secret");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.ledger.max_update_attempts, 5);
                assert_eq!(config.ledger.reconcile_interval_secs, 60);
                assert!(!config.ledger.revoke_grants_on_removal);
                assert_eq!(config.auth.cookie_name, "starledger_token");
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("STARLEDGER__DATABASE__URL", None::<&str>),
                ("STARLEDGER__JWT__SECRET", Some("env-secret")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.max_update_attempts, 3);
        assert_eq!(ledger.reconcile_interval_secs, 60);
        assert!(!ledger.revoke_grants_on_removal);
    }
}
