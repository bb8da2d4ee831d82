use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use inkroom::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")))
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.socket_addr();
    tracing::info!(
        %addr,
        idle_timeout_secs = config.room_idle_timeout.as_secs(),
        chat_dir = %config.chat_dir.display(),
        "inkroom starting"
    );

    let state = inkroom::build_state(config);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "inkroom listening");
    inkroom::serve(listener, state).await?;
    Ok(())
}
