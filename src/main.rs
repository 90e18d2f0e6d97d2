use kpi_report_bot::{router, AppState, Config, MetricStore, TelegramBot};
use std::net::SocketAddr;
use tokio::{fs, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = MetricStore::restore(&config.data_path).await;
    let state = AppState::new(config.data_path.clone(), store);
    let bot = TelegramBot::new(&config, state.clone())?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = tokio::spawn(async move { axum::serve(listener, router(state)).await });

    tokio::select! {
        result = bot.run() => result?,
        result = server => result??,
        _ = signal::ctrl_c() => info!("bot stopped by user"),
    }

    Ok(())
}
