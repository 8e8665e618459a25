mod db;
mod error;
mod notification;
mod push;
mod routes;
mod state;
mod subscription;

use db::{create_pool, run_migrations};
use notification::{
    start_notification_scheduler, NotificationDispatcher, NotificationRepository,
    NotificationScheduler, NotificationService, NotificationStore, SystemClock,
};
use routes::create_router;
use state::{AppState, Config};
use std::sync::Arc;
use subscription::{SubscriptionRepository, SubscriptionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,push_dispatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Push credentials are read once here and injected into the dispatcher
    let push_sender = push::build_sender(&config.push)?;

    // Create repositories
    let notification_repository: Arc<dyn NotificationStore> =
        Arc::new(NotificationRepository::new(db.clone()));
    let subscription_repository: Arc<dyn SubscriptionStore> =
        Arc::new(SubscriptionRepository::new(db.clone()));

    // Create services
    let dispatcher = NotificationDispatcher::new(
        notification_repository.clone(),
        subscription_repository.clone(),
        push_sender,
        config.push.concurrency,
    );
    let notification_service = NotificationService::new(
        notification_repository.clone(),
        subscription_repository,
        dispatcher.clone(),
    );

    // Start notification scheduler
    let scheduler = NotificationScheduler::new(
        notification_repository,
        dispatcher,
        Arc::new(SystemClock),
    );
    let scheduled_dispatch = start_notification_scheduler(scheduler, &config.scheduler_cron).await?;

    let state = AppState {
        notification_service,
    };
    let app = create_router(state);

    let addr = config.bind_addr();
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduled_dispatch.shutdown().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
