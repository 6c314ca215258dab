use mood_journal::{AppState, Config, Journal, LocalStorage, reminder, router};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let storage = LocalStorage::open(&config.data_path, config.storage_quota).await;
    let state = AppState::new(Journal::load(storage));
    reminder::spawn(state.clone(), config.reminder_hour);

    let app = router(state, config.import_body_limit());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!(
        data_path = %config.data_path.display(),
        quota = config.storage_quota,
        "listening on http://{addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
