use anyhow::Context;
use tokio::net::TcpListener;

use catch_roulette::config::Config;
use catch_roulette::{app, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = Config::from_env().context("reading configuration")?;
    let state = AppState::from_config(&config)?;
    tracing::info!(
        static_dir = %config.static_dir.display(),
        touchdown_rate = config.touchdown_rate,
        "serving"
    );

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
