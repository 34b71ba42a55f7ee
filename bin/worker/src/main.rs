mod config;

use config::WorkerConfig;
use copper_relay_accounts::{AccountRegistry, AccountSupervisor};
use copper_relay_ai::{OpenAiCompatBackend, PersonaResponder};
use copper_relay_conversation::ConversationRouter;
use copper_relay_messenger::{TelegramMessenger, UpdateHandler};
use copper_relay_store::{AccountChangeFeed, PgAccountDirectory, PgConversationStore};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = WorkerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Create database connection pool; the service credential is applied
    // on top of the store URL
    let connect_options = PgConnectOptions::from_str(&config.store.url)
        .expect("invalid store URL")
        .password(&config.store.service_key);
    let db_pool = PgPoolOptions::new()
        .max_connections(config.store.max_connections)
        .connect_with(connect_options)
        .await
        .expect("failed to connect to store");

    // Assemble the routing pipeline
    let registry = Arc::new(AccountRegistry::new());
    let backend = OpenAiCompatBackend::new(
        &config.generation.base_url,
        &config.generation.api_key,
        config.generation.params(),
    )
    .expect("failed to build generation backend");
    let router = Arc::new(ConversationRouter::new(
        registry.clone(),
        PgConversationStore::new(db_pool.clone()),
        PersonaResponder::new(backend),
    ));

    // Per-message error isolation lives here: the handler logs a failed
    // update and drops it, so one bad message never halts a session
    let handler: UpdateHandler = {
        let router = router.clone();
        Arc::new(move |account_id, update| {
            let router = router.clone();
            Box::pin(async move {
                match router.handle_update(account_id, update).await {
                    Ok(outcome) => {
                        tracing::debug!(account_id = %account_id, outcome = ?outcome, "update routed");
                    }
                    Err(e) => {
                        tracing::error!(account_id = %account_id, error = %e, "update dropped");
                    }
                }
            })
        })
    };

    let supervisor = Arc::new(AccountSupervisor::new(
        PgAccountDirectory::new(db_pool.clone()),
        TelegramMessenger::new(config.messenger.connection_retries),
        registry,
        handler,
    ));

    // Connect everything that is active now
    supervisor
        .load_active_accounts()
        .await
        .expect("failed to load active accounts");

    // Then follow the change feed for accounts activated later
    let events = AccountChangeFeed::new(db_pool, config.store.change_channel.clone())
        .subscribe()
        .await
        .expect("failed to subscribe to account changes");
    let watch_supervisor = supervisor.clone();
    tokio::spawn(async move {
        watch_supervisor.watch_account_changes(events).await;
    });

    // Immediate exit on termination; in-flight sends and writes are not
    // drained
    wait_for_shutdown().await;
    tracing::info!("shutdown signal received, exiting");
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
