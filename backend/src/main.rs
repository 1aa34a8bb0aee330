//! Employee Portal Backend
//!
//! Account registration, session login, password reset and a manager-gated
//! employee roster over PostgreSQL.
//!
//! ## Architecture
//!
//! - Routes: HTTP request handling and routing
//! - Services: account and roster rules
//! - Repositories: credential store (PostgreSQL)
//! - Email: reset-link delivery

use anyhow::{Context, Result};
use employee_portal_backend::{
    config, db, email, repositories::UserRepository, routes, state::AppState,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;
    let production = config::AppConfig::is_production();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if production { "production" } else { "development" },
        "Starting Employee Portal Backend"
    );

    if production {
        validate_production_config(&config)?;
    }

    info!("Connecting to database...");
    let pool = db::create_pool(&config.database).await?;

    // EP__DATABASE__RUN_MIGRATIONS=true opts production in
    if config.database.run_migrations {
        db::run_migrations(&pool).await?;
    } else {
        info!("Skipping migrations (database.run_migrations = false)");
    }

    let mailer = email::mailer_from_config(&config.email)?;
    if !config.email.enabled {
        info!("Email delivery disabled; reset links will be logged");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let base_path = config.server.base_path.clone();

    let state = AppState::new(Arc::new(UserRepository::new(pool)), mailer, config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, base_path = %base_path, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "employee_portal_backend=info,tower_http=info".into()
        } else {
            "employee_portal_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Refuse to start production with development secrets
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let errors = config.production_errors();
    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
