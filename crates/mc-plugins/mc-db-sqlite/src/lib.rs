//! # mc-db-sqlite Implementation
//!
//! This crate implements the data mapping between the SQLite relational model
//! and the `mc-core` domain models. One `SqliteCatalog` serves all three ports.

mod catalog;
mod interactions;
mod notifications;

use std::str::FromStr;
use std::time::Duration;

use mc_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

const SCHEMA: &str = include_str!("schema.sql");

pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Opens (or creates) the database at `url` and applies the schema.
    ///
    /// # Developer Note
    /// `sqlite::memory:` databases live inside a single connection, so the pool
    /// is pinned to one connection that never idles out.
    pub async fn new(url: &str) -> Result<Self> {
        Self::with_max_connections(url, 5).await
    }

    pub async fn with_max_connections(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(db_err)?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await.map_err(db_err)?;
        tracing::debug!(url, in_memory, "sqlite catalog ready");

        Ok(Self { pool })
    }

    /// Fresh in-memory database, used by tests and demos.
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }
}

/// Maps a driver error without write context.
pub(crate) fn db_err(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::Internal("row unexpectedly missing".to_string()),
        _ => AppError::Internal(err.to_string()),
    }
}

/// Maps a write error, turning constraint violations into domain errors
/// named after the record being written.
pub(crate) fn write_err(what: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("{what} already exists"))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::ValidationError(format!("{what} references a missing record"))
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            AppError::ValidationError(format!("{what} violates a constraint: {}", db.message()))
        }
        _ => db_err(err),
    }
}

/// Appends `(?, ?, ...)` with one bound id per element.
pub(crate) fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[Uuid]) {
    qb.push("(");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}
