//! # Mini-Catalog Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use mc_api::middleware::{cors_policy, security_headers, standard_middleware};
use mc_api::{configure_routes, AppState};
use mc_config::{LogSettings, Settings};
use mc_services::RecommendationPolicy;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use mc_db_sqlite::SqliteCatalog;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("mini-catalog needs a storage plugin; enable the `db-sqlite` feature");

/// `RUST_LOG` wins over the configured filter. Installing the subscriber
/// also bridges `log` records, which is how actix-web's access log arrives.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(&settings.log);
    if let Some(path) = &settings.env_file {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = {
        let db = &settings.database;
        SqliteCatalog::with_max_connections(&db.url, db.max_connections)
            .await
            .with_context(|| format!("failed to open catalog database {}", db.url))?
    };

    // 2. Wire services (dynamic dispatch over the ports)
    let policy =
        RecommendationPolicy { include_favorites: settings.recommendations.include_favorites };
    let state = web::Data::new(AppState::new(Arc::new(store), policy));

    let (host, port) = settings.bind_address();
    tracing::info!(
        %host,
        port,
        include_favorites = policy.include_favorites,
        "mini-catalog starting"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(standard_middleware())
            .wrap(security_headers())
            .wrap(cors_policy())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind {host}:{port}"))?
    .run()
    .await?;

    tracing::info!("mini-catalog stopped");
    Ok(())
}
