mod config;
mod routes;
mod state;

use tracing_subscriber::EnvFilter;
use trunker::TrunkerOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::from_env()?;
    let options = TrunkerOptions::from_process_env(None)?;

    let state = state::AppState::new(options, &config);
    tracing::info!(flags = ?state.trunker.flags().names().collect::<Vec<_>>(), "flags loaded");

    let app = routes::routes(state);

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;

    tracing::info!(addr = %config.addr(), "server is chilling");

    axum::serve(listener, app).await?;
    Ok(())
}
