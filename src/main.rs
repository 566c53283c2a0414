use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use filmfinder::{api::routes::create_router, config::Config, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("filmfinder=info,tower_http=info")),
        )
        .with_target(true)
        .init();

    let server_addr = config.server_addr;
    info!(
        secrets_file = ?config.secrets_file,
        model = %config.completion_model,
        "starting filmfinder"
    );

    let app_state = AppState::from_config(config)?;
    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;
    info!("listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
