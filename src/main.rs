use cashflow::{
    api::{AppState, build_router},
    cache::{KeyCache, TtlCache, spawn_sweeper},
    config::{database, settings},
    core::credentials::{CredentialResolver, Submitter},
    errors::Result,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the main application configuration
    let app_config = settings::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(parser = ?app_config.websms.parser, "Configuration loaded");

    // 4. Initialize database
    let db = database::create_connection(&app_config.database.url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Credential cache and its sweeper
    let ttl = app_config.websms.key_cache_ttl();
    let cache: Arc<dyn KeyCache<Submitter>> = Arc::new(TtlCache::new(ttl));
    let sweeper = spawn_sweeper(Arc::clone(&cache), ttl);
    if app_config.websms.default_api_key.is_none() {
        warn!("WEBSMS_API_KEY not set; only stored keys are accepted");
    }
    let resolver = CredentialResolver::new(
        cache,
        app_config.websms.default_api_key.clone(),
        app_config.websms.default_group.clone(),
    );

    // 6. Serve until Ctrl-C
    let state = AppState {
        db: Arc::new(db),
        parser: app_config.websms.parser,
        resolver: Arc::new(resolver),
    };
    let listener = TcpListener::bind(app_config.server.bind_addr.as_str())
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", app_config.server.bind_addr, e))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
