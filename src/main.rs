use anyhow::Context;

use nihongo_drill::api::{app_router, ApiState};
use nihongo_drill::{Catalog, Config, SessionSettings, SqliteStore, StudySession, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .init();

    let store = SqliteStore::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;

    let catalog = Catalog::load(config.vocabulary_file.as_deref(), config.particle_file.as_deref());
    let settings = SessionSettings {
        level: config.level,
        batch_size: config.batch_size,
        seed: None,
    };
    let session = StudySession::new(store, SystemClock, catalog, settings).await;

    let app = app_router(ApiState::new(session), config.static_dir.clone());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("nihongo-drill listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
    }
}
