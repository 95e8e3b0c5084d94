//! # mc-config
//!
//! Layered runtime settings. Later layers win:
//!
//! 1. built-in defaults
//! 2. `config/catalog.toml` (optional)
//! 3. `CATALOG__<SECTION>__<KEY>` environment variables, after `.env` is loaded
//!
//! e.g. `CATALOG__SERVER__PORT=9000` or `CATALOG__RECOMMENDATIONS__INCLUDE_FAVORITES=false`.

use std::path::PathBuf;

use config::{Config, ConfigBuilder, Environment, File, FileFormat, Map};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config/catalog.toml";
pub const ENV_PREFIX: &str = "CATALOG";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection string, e.g. `sqlite://catalog.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RecommendationSettings {
    /// Recommend listings the user has already favorited.
    pub include_favorites: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub recommendations: RecommendationSettings,
    pub log: LogSettings,
    /// The `.env` file that was applied, if any. Settings load before the
    /// subscriber exists, so the binary reports this once tracing is up.
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

fn with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, SettingsError> {
    Ok(Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080_i64)?
        .set_default("database.url", "sqlite://catalog.db")?
        .set_default("database.max_connections", 5_i64)?
        .set_default("recommendations.include_favorites", true)?
        .set_default("log.filter", "info")?
        .set_default("log.json", false)?)
}

impl Settings {
    /// Loads `.env`, then resolves every layer from the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let env_file = match dotenvy::dotenv() {
            Ok(path) => Some(path),
            Err(err) if err.not_found() => None,
            Err(err) => return Err(err.into()),
        };

        let builder = with_defaults()?
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(environment(None));
        Ok(Self { env_file, ..Self::finish(builder)? })
    }

    /// Resolves settings from an inline TOML document and an explicit
    /// environment map instead of the filesystem and process environment.
    pub fn from_sources(toml: &str, env: Map<String, String>) -> Result<Self, SettingsError> {
        let builder = with_defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(environment(Some(env)));
        Self::finish(builder)
    }

    fn finish(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.server.port == 0 {
            return Err(SettingsError::Invalid("server.port must be non-zero".into()));
        }
        if self.database.url.trim().is_empty() {
            return Err(SettingsError::Invalid("database.url must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn environment(source: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .source(source)
}
