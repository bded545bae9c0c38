//! # forum-server
//!
//! Assembles the application: configuration, logging, the selected store,
//! services and the HTTP router.

mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState};
use configs::{AppConfig, Backend, DatabaseSettings};
use services::Services;
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&settings.log);

    let services = build_services(&settings.database).await?;
    let app = router(AppState::new(services));

    let addr = settings.server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "forum server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("forum server stopped");
    Ok(())
}

async fn build_services(database: &DatabaseSettings) -> anyhow::Result<Services> {
    match database.backend {
        Backend::Memory => {
            warn!("using the in-memory store; data is lost on exit");
            Ok(Services::new(Arc::new(MemoryStore::new())))
        }
        Backend::Postgres => connect_postgres(database).await,
    }
}

#[cfg(feature = "db-postgres")]
async fn connect_postgres(database: &DatabaseSettings) -> anyhow::Result<Services> {
    use secrecy::ExposeSecret;
    use storage_adapters::PgStore;

    let store = PgStore::connect(
        database.url.expose_secret(),
        database.max_connections,
        database.acquire_timeout(),
    )
    .await
    .context("failed to connect to postgres")?;
    if database.run_migrations {
        store.migrate().await.context("failed to run migrations")?;
    }
    Ok(Services::new(Arc::new(store)))
}

#[cfg(not(feature = "db-postgres"))]
async fn connect_postgres(_database: &DatabaseSettings) -> anyhow::Result<Services> {
    anyhow::bail!("postgres backend requested but the binary was built without `db-postgres`")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
