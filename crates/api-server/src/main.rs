//! API server for the task-list application
//!
//! Serves the REST API for task CRUD operations, persisting tasks
//! through the store in `tasklist-core`.

mod routes;
mod state;

use axum::http::{Method, StatusCode, Uri};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

const DEFAULT_PORT: u16 = 5000;

async fn fallback(method: Method, uri: Uri) -> (StatusCode, &'static str) {
    tracing::debug!("Request reached fallback handler: {} {}", method, uri);
    (StatusCode::NOT_FOUND, "Not Found")
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine data directory; running without a persistence location is fatal
    let data_dir = match std::env::var("TASKLIST_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            tracing::error!("TASKLIST_DATA_DIR is not set");
            std::process::exit(1);
        }
    };

    tracing::info!("Using data directory: {:?}", data_dir);

    // Create application state with the injected store
    let app_state = match AppState::new(data_dir).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize task store: {}", e);
            std::process::exit(1);
        }
    };

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::task::router())
        .with_state(app_state)
        .fallback(fallback)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server running on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
