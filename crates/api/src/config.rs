//! Application configuration loaded from environment variables.

use std::time::Duration;

use cache::TierTtls;
use common::{CatalogSettings, SettingsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid catalog settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("invalid cache settings: {0}")]
    Cache(#[from] cache::CacheError),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `text` or `json` (default `text`)
/// - `DATABASE_URL`: selects the PostgreSQL store when set
/// - `DEFAULT_LOCALE`, `SUPPORTED_LOCALES`: default `en`, `de,es,fr`
/// - `DEFAULT_CURRENCY`, `SUPPORTED_CURRENCIES`: default `EUR`, `USD,GBP`
/// - `CACHE_L1_TTL_SECS`, `CACHE_L2_TTL_SECS`: default 30 and 300
/// - `NOTIFICATION_CHANNEL_CAPACITY`: default 1024
/// - `SSE_KEEP_ALIVE_SECS`: default 15
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub default_locale: String,
    pub supported_locales: String,
    pub default_currency: String,
    pub supported_currencies: String,
    pub cache_l1_ttl: Duration,
    pub cache_l2_ttl: Duration,
    pub notification_capacity: usize,
    pub sse_keep_alive: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |name: &str, default: String| lookup(name).unwrap_or(default);
        let number = |name: &str, default: u64| {
            lookup(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        Self {
            host: text("HOST", defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_level: text("RUST_LOG", defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            default_locale: text("DEFAULT_LOCALE", defaults.default_locale),
            supported_locales: text("SUPPORTED_LOCALES", defaults.supported_locales),
            default_currency: text("DEFAULT_CURRENCY", defaults.default_currency),
            supported_currencies: text("SUPPORTED_CURRENCIES", defaults.supported_currencies),
            cache_l1_ttl: Duration::from_secs(number(
                "CACHE_L1_TTL_SECS",
                defaults.cache_l1_ttl.as_secs(),
            )),
            cache_l2_ttl: Duration::from_secs(number(
                "CACHE_L2_TTL_SECS",
                defaults.cache_l2_ttl.as_secs(),
            )),
            notification_capacity: number(
                "NOTIFICATION_CHANNEL_CAPACITY",
                defaults.notification_capacity as u64,
            )
            .max(1) as usize,
            sse_keep_alive: Duration::from_secs(number(
                "SSE_KEEP_ALIVE_SECS",
                defaults.sse_keep_alive.as_secs(),
            )),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn catalog_settings(&self) -> Result<CatalogSettings, ConfigError> {
        Ok(CatalogSettings::from_codes(
            &self.default_locale,
            &self.supported_locales,
            &self.default_currency,
            &self.supported_currencies,
        )?)
    }

    pub fn cache_ttls(&self) -> Result<TierTtls, ConfigError> {
        Ok(TierTtls::new(self.cache_l1_ttl, self.cache_l2_ttl)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            default_locale: "en".to_string(),
            supported_locales: "de,es,fr".to_string(),
            default_currency: "EUR".to_string(),
            supported_currencies: "USD,GBP".to_string(),
            cache_l1_ttl: Duration::from_secs(30),
            cache_l2_ttl: Duration::from_secs(300),
            notification_capacity: 1024,
            sse_keep_alive: Duration::from_secs(15),
        }
    }
}
