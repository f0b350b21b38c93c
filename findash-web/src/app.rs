//! Router and server.

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use findash_core::ServerConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::routes::{health, page, view};
use crate::state::AppState;

/// Build the router with every route and middleware attached.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(page::index))
        .route("/health", get(health::health))
        .route("/api/options", get(view::get_options))
        .route("/api/view", get(view::get_view))
        .route("/api/table.csv", get(view::get_table_csv))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, config: &ServerConfig) -> std::io::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "dashboard listening");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!(error = %e, "could not install Ctrl-C handler; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
