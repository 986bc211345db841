//! Configuration management for the favorites service
//!
//! Settings are layered, lowest priority first:
//! 1. built-in defaults
//! 2. optional YAML file (`FAVORITES_CONFIG`, default `config/favorites.yaml`)
//! 3. `FAVORITES__SECTION__KEY` environment variables
//!
//! Token secrets are deliberately not part of [`Settings`]: they are read from
//! the process environment only (see [`TokenSecrets::from_env`]).

use anyhow::{anyhow, bail, Context, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/favorites.yaml";
const MIN_SECRET_LENGTH: usize = 32;
const MINUTE_SECS: u64 = 60;
const DAY_SECS: u64 = 24 * 60 * 60;

pub const ACCESS_SECRET_VAR: &str = "ACCESS_TOKEN_SECRET";
pub const REFRESH_SECRET_VAR: &str = "REFRESH_TOKEN_SECRET";

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub cache: CacheSettings,
    pub jwt: JwtSettings,
    pub catalog: CatalogSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: String,
    pub connect_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub ttl_minutes: u64,
}

/// Token lifetimes. The signing secrets live in [`TokenSecrets`].
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `json` or `pretty`
    pub format: String,
}

impl Settings {
    /// Load settings from defaults, the YAML file and the environment.
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        let path = env::var("FAVORITES_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let settings: Settings = Self::defaults()?
            .add_source(File::new(&path, FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix("FAVORITES")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML document layered over the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Settings = Self::defaults()?
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 20)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.run_migrations", true)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("redis.connect_timeout_ms", 2000)?
            .set_default("redis.command_timeout_ms", 500)?
            .set_default("cache.ttl_minutes", 60)?
            .set_default("jwt.access_ttl_minutes", 15)?
            .set_default("jwt.refresh_ttl_days", 7)?
            .set_default("catalog.base_url", "https://api.themoviedb.org/3")?
            .set_default("catalog.timeout_ms", 3000)?
            .set_default("catalog.max_concurrency", 4)?
            .set_default("log.format", "json")?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be greater than 0");
        }
        if self.database.url.is_empty() {
            bail!("database.url is required");
        }
        if self.cache.ttl_minutes == 0 {
            bail!("cache.ttl_minutes must be greater than 0");
        }
        if self.jwt.access_ttl_minutes == 0 || self.jwt.refresh_ttl_days == 0 {
            bail!("token lifetimes must be greater than 0");
        }
        lifetime_secs(self.cache.ttl_minutes, MINUTE_SECS)
            .ok_or_else(|| anyhow!("cache.ttl_minutes is too large"))?;
        lifetime_secs(self.jwt.access_ttl_minutes, MINUTE_SECS)
            .ok_or_else(|| anyhow!("jwt.access_ttl_minutes is too large"))?;
        lifetime_secs(self.jwt.refresh_ttl_days, DAY_SECS)
            .ok_or_else(|| anyhow!("jwt.refresh_ttl_days is too large"))?;
        if self.catalog.api_key.is_empty() {
            bail!("catalog.api_key is required");
        }
        if self.catalog.max_concurrency == 0 {
            bail!("catalog.max_concurrency must be greater than 0");
        }
        if self.redis.command_timeout_ms == 0 || self.catalog.timeout_ms == 0 {
            bail!("timeouts must be greater than 0");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `value * unit` seconds, or `None` when the product does not fit in an
/// `i64` (token `exp` claims are signed Unix seconds).
fn lifetime_secs(value: u64, unit: u64) -> Option<u64> {
    value
        .checked_mul(unit)
        .filter(|secs| i64::try_from(*secs).is_ok())
}

// Accessors saturate; `validate` is what rejects out-of-range values.
fn lifetime(value: u64, unit: u64) -> Duration {
    Duration::from_secs(lifetime_secs(value, unit).unwrap_or(i64::MAX as u64))
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        lifetime(self.ttl_minutes, MINUTE_SECS)
    }
}

impl JwtSettings {
    pub fn access_ttl(&self) -> Duration {
        lifetime(self.access_ttl_minutes, MINUTE_SECS)
    }

    pub fn refresh_ttl(&self) -> Duration {
        lifetime(self.refresh_ttl_days, DAY_SECS)
    }
}

impl RedisSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl CatalogSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// HMAC secrets for access and refresh tokens.
pub struct TokenSecrets {
    pub access: SecretString,
    pub refresh: SecretString,
}

impl TokenSecrets {
    /// Read both secrets from the process environment.
    pub fn from_env() -> Result<Self> {
        let access = env::var(ACCESS_SECRET_VAR)
            .with_context(|| format!("{} environment variable not set", ACCESS_SECRET_VAR))?;
        let refresh = env::var(REFRESH_SECRET_VAR)
            .with_context(|| format!("{} environment variable not set", REFRESH_SECRET_VAR))?;
        Self::new(access, refresh)
    }

    pub fn new(access: String, refresh: String) -> Result<Self> {
        if access.len() < MIN_SECRET_LENGTH || refresh.len() < MIN_SECRET_LENGTH {
            return Err(anyhow!(
                "token secrets must be at least {} bytes",
                MIN_SECRET_LENGTH
            ));
        }
        if access == refresh {
            return Err(anyhow!("access and refresh secrets must differ"));
        }
        Ok(Self {
            access: SecretString::from(access),
            refresh: SecretString::from(refresh),
        })
    }

    pub fn access_bytes(&self) -> &[u8] {
        self.access.expose_secret().as_bytes()
    }

    pub fn refresh_bytes(&self) -> &[u8] {
        self.refresh.expose_secret().as_bytes()
    }
}

impl std::fmt::Debug for TokenSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSecrets").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
database:
  url: postgres://localhost/favorites
catalog:
  api_key: test-key
"#;

    #[test]
    fn test_defaults_fill_unspecified_values() {
        let settings = Settings::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(settings.jwt.access_ttl(), Duration::from_secs(15 * 60));
        assert_eq!(settings.jwt.refresh_ttl(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(settings.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(settings.catalog.max_concurrency, 4);
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = r#"
database:
  url: postgres://localhost/favorites
catalog:
  api_key: test-key
cache:
  ttl_minutes: 5
jwt:
  access_ttl_minutes: 30
"#;
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.cache.ttl(), Duration::from_secs(300));
        assert_eq!(settings.jwt.access_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn test_missing_database_url_fails() {
        assert!(Settings::from_yaml_str("catalog:\n  api_key: k\n").is_err());
    }

    #[test]
    fn test_zero_cache_ttl_rejected() {
        let yaml = format!("{}cache:\n  ttl_minutes: 0\n", MINIMAL);
        assert!(Settings::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_oversized_lifetimes_rejected() {
        let yaml = format!("{}jwt:\n  refresh_ttl_days: 300000000000000\n", MINIMAL);
        let err = Settings::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("refresh_ttl_days"));

        let yaml = format!("{}cache:\n  ttl_minutes: {}\n", MINIMAL, u64::MAX / 2);
        assert!(Settings::from_yaml_str(&yaml).is_err());

        let jwt = JwtSettings {
            access_ttl_minutes: u64::MAX,
            refresh_ttl_days: u64::MAX,
        };
        assert_eq!(jwt.refresh_ttl(), Duration::from_secs(i64::MAX as u64));
    }

    #[test]
    fn test_secrets_must_be_long_and_distinct() {
        let long_a = "a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7".to_string();
        let long_b = "z9y8x7w6v5u4t3s2r1q0p9o8n7m6l5k4j3".to_string();
        assert!(TokenSecrets::new("short".into(), long_b.clone()).is_err());
        assert!(TokenSecrets::new(long_a.clone(), long_a.clone()).is_err());
        let secrets = TokenSecrets::new(long_a.clone(), long_b).unwrap();
        assert_eq!(secrets.access_bytes(), long_a.as_bytes());
        assert!(!format!("{:?}", secrets).contains(&long_a));
    }
}
