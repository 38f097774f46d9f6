//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger posting settings.
    #[serde(default)]
    pub ledger: LedgerSettings,
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

/// Settings used by the voucher posting engine.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Tenant base (functional) currency.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Zero-padded width of the sequence part of voucher numbers.
    #[serde(default = "default_voucher_number_width")]
    pub voucher_number_width: usize,
}

fn default_base_currency() -> String {
    "INR".to_string()
}

fn default_voucher_number_width() -> usize {
    6
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            voucher_number_width: default_voucher_number_width(),
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
            .add_source(config::Environment::with_prefix("HISAAB").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_settings_defaults() {
        let settings = LedgerSettings::default();
        assert_eq!(settings.base_currency, "INR");
        assert_eq!(settings.voucher_number_width, 6);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("HISAAB__DATABASE__URL", Some("postgres://localhost/hisaab_test")),
                ("HISAAB__LEDGER__BASE_CURRENCY", Some("USD")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/hisaab_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.ledger.base_currency, "USD");
                assert_eq!(config.ledger.voucher_number_width, 6);
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_var_unset("HISAAB__DATABASE__URL", || {
            assert!(AppConfig::load().is_err());
        });
    }
}
