use anyhow::Result;
use chat_edge_core::{
    Clock, ConversationStore, KeyValueStore, MessageRepository, RateLimiter, SystemClock,
};
use chat_edge_infrastructure::{
    create_pool, InMemoryKeyValueStore, InMemoryMessageRepository, PgMessageRepository,
    RedisKeyValueStore,
};
use chat_edge_server::{
    build_router,
    config::{DatabaseBackend, KvBackend, Settings},
    services::{ContextProvider, LlmService, NoContext, SearchService},
    utils::init_logger,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    init_logger(&settings.logging)?;
    info!("🚀 Starting chat edge server v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let kv_store: Arc<dyn KeyValueStore> = match settings.kv.backend {
        KvBackend::Redis => {
            let store = RedisKeyValueStore::new(&settings.kv.url, settings.kv.pool_max_size)?;
            info!("✅ Redis key-value store configured");
            Arc::new(store)
        }
        KvBackend::Memory => {
            let store = Arc::new(InMemoryKeyValueStore::new(clock.clone()));
            spawn_purge_task(store.clone(), settings.rate_limit.window_ms);
            info!("✅ In-memory key-value store configured");
            store
        }
    };

    let repository: Arc<dyn MessageRepository> = match settings.database.backend {
        DatabaseBackend::Postgres => {
            let pool = create_pool(
                &settings.database.url,
                settings.database.pool_max_size,
                settings.database.pool_timeout_seconds,
            )
            .await?;
            let repository = PgMessageRepository::new(pool);
            repository.ensure_schema().await?;
            info!("✅ Database connection established");
            Arc::new(repository)
        }
        DatabaseBackend::Memory => {
            info!("✅ In-memory message store configured");
            Arc::new(InMemoryMessageRepository::new())
        }
    };

    let rate_limiter = Arc::new(RateLimiter::new(
        kv_store,
        clock.clone(),
        settings.rate_limit.clone(),
    ));
    let conversations = Arc::new(ConversationStore::new(
        repository,
        clock.clone(),
        settings.conversation.store_config(),
    ));

    let llm = Arc::new(LlmService::new(settings.llm.clone())?);
    let context: Arc<dyn ContextProvider> = if settings.context.enabled {
        info!("✅ Context enrichment enabled ({})", settings.context.base_url);
        Arc::new(SearchService::new(settings.context.clone())?)
    } else {
        Arc::new(NoContext)
    };

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let state = AppState::new(settings, clock, rate_limiter, conversations, llm, context);
    let app = build_router(state);

    info!("🎯 Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

/// Drops expired counters from the in-memory store once per window.
fn spawn_purge_task(store: Arc<InMemoryKeyValueStore>, window_ms: u64) {
    let period = Duration::from_millis(window_ms.max(1_000));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::debug!("Purged {} expired rate limit counters", purged);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
