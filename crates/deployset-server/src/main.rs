use std::sync::Arc;

use deployset_server::config::Config;
use deployset_server::memory::MemoryRepository;
use deployset_server::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    let state = AppState {
        repo: Arc::new(MemoryRepository::new()),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    log::info!("listening on port {}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
