//! Inkwell entry-point: loads configuration, prepares storage, and serves the
//! REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use inkwell::domain::TokenService;
use inkwell::inbound::http::health::HealthState;
use inkwell::inbound::http::token_config::{BuildMode, token_config_from_env};
use inkwell::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use inkwell::settings::AppSettings;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|e| std::io::Error::other(format!("invalid bind address: {e}")))?;

    let token_config =
        token_config_from_env(&DefaultEnv::default(), BuildMode::from_debug_assertions())
            .map_err(std::io::Error::other)?;
    let tokens = Arc::new(TokenService::new(
        token_config.settings,
        Arc::new(DefaultClock),
    ));

    let mut config = ServerConfig::new(bind_addr, tokens);
    match settings.database_url() {
        Some(database_url) => {
            if settings.skip_migrations {
                info!("skipping database migrations");
            } else {
                run_migrations(database_url)
                    .await
                    .map_err(|e| std::io::Error::other(format!("migrations failed: {e}")))?;
            }
            let pool = DbPool::new(
                PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
            )
            .await
            .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
            config = config.with_db_pool(pool);
        }
        None => {
            warn!("no database configured; records are kept in memory only");
        }
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting server");
    create_server(health_state, config)?.await
}
