use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::info;

use messageapp::config::Config;
use messageapp::{api, seed, shutdown, AppState};
use messages::db::{self, PgMessageRepository};
use messages::memory::InMemoryMessageRepository;
use messages::repository::MessageRepository;
use messages::MessagesService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "messageapp=info,messages=info,tower_http=info".into()),
        )
        .json()
        .init();

    let config = Config::parse();
    config.validate()?;
    info!(listen_addr = %config.listen_addr, in_memory = config.in_memory, "messageapp starting");

    let repo: Arc<dyn MessageRepository> = match (&config.database_url, config.in_memory) {
        (Some(url), false) => {
            let pool = db::create_pool(url).map_err(|e| anyhow!(e))?;
            if config.migrate {
                db::run_migrations(&pool).await.map_err(|e| anyhow!(e))?;
            }
            let repo = PgMessageRepository::new(pool);
            repo.ping().await.context("database unreachable")?;
            Arc::new(repo)
        }
        _ => {
            info!("using in-memory storage");
            Arc::new(InMemoryMessageRepository::new())
        }
    };

    let service = MessagesService::new(repo);
    seed::seed_messages(&service, config.seed_messages).await?;

    let state = Arc::new(AppState::new(service, config.log_requests)?);

    // Spawn shutdown handler
    let shutdown_state = state.clone();
    let shutdown_handle = tokio::spawn(async move {
        shutdown::wait_for_shutdown(shutdown_state).await;
    });

    // Start API server
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_handle.await.ok();
        })
        .await
        .context("server error")?;

    info!("messageapp stopped");
    Ok(())
}
