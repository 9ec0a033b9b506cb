use server::services::polling;
use server::{AppState, ServerConfig, routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;
    let port = config.port;
    let state = AppState::new(config);

    let _reaper = polling::spawn_reaper(state.clone());

    let app = routes::app(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, channel_path = %state.config.channel_path, "wall server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
