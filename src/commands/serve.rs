use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::store::repo;
use crate::web::{self, AppState};

/// Run the web server until interrupted.
pub fn run(config: &Config) -> Result<()> {
    let state = AppState::new(repo::open_store(config)?)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config, state))
}

async fn serve(config: &Config, state: AppState) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, db = %config.db_path.display(), "serving task list");

    axum::serve(listener, web::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
