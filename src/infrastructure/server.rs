//! HTTP 服务基础设施

use axum::{extract::DefaultBodyLimit, middleware, Router};
use tokio::{net::TcpListener, signal};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::app::users::{dispatch, AppState};
use crate::core::{error::panic_response, middleware::request_logging_middleware};

/// Every request lands in [`dispatch`]; it owns the route table. Request
/// bodies are not size-limited.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Binds `bind_address:port` and serves until Ctrl-C.
pub async fn serve(bind_address: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind((bind_address, port)).await?;
    info!("Server is listening on port {}", port);

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server on port {} stopped", port);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
