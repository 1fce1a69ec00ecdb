use duoroom::{
    build_router,
    store::{InMemoryKeyValueStore, KeyValueStore, PostgresKeyValueStore, TimeoutKeyValueStore},
    AppConfig, AppState, EventBus,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duoroom=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    info!(
        bind_addr = %config.bind_addr,
        room_ttl_secs = config.room_ttl.as_secs(),
        store_timeout_ms = config.store_timeout.as_millis() as u64,
        "Starting duoroom server"
    );

    // Postgres when configured, otherwise the in-memory store
    let backend: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            let store = PostgresKeyValueStore::new(pool);
            store.migrate().await?;
            info!("Using PostgreSQL key-value store");
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory key-value store");
            Arc::new(InMemoryKeyValueStore::new())
        }
    };
    let store = Arc::new(TimeoutKeyValueStore::new(backend, config.store_timeout));

    let app_state = AppState::new(store, EventBus::new(), &config);
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
