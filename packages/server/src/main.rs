use std::sync::Arc;

use anyhow::Context;
use common::storage::{InMemoryObjectStore, ObjectStore, S3ObjectStore, s3::S3Config};
use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::database::init_db;
use server::seed::seed_bootstrap_email;
use server::state::AppState;
use server::tasks::session_sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    info!("Database connected and schema synced");

    seed_bootstrap_email(&db, config.auth.bootstrap_email.as_deref()).await?;

    let object_store: Arc<dyn ObjectStore> = match config.storage.backend.as_str() {
        "memory" => {
            warn!("Using the in-memory object store; uploads will not survive a restart");
            Arc::new(InMemoryObjectStore::new())
        }
        _ => Arc::new(
            S3ObjectStore::new(&S3Config {
                bucket: config.storage.bucket.clone(),
                region: config.storage.region.clone(),
                endpoint: config.storage.endpoint.clone(),
                access_key: config.storage.access_key.clone(),
                secret_key: config.storage.secret_key.clone(),
                public_base_url: config.storage.public_base_url.clone(),
                timeout_secs: config.storage.timeout_secs,
            })
            .context("Failed to initialize the S3 object store")?,
        ),
    };

    tokio::spawn(session_sweeper::run(
        db.clone(),
        config.session_sweep.interval_secs,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(db, object_store, config);
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
