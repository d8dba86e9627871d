//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Opens the database
//! - Starts the HTTP server with graceful shutdown support

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shortener::config::{Config, DEFAULT_LOG_FILTER};
use shortener::database::{AppState, RedbStore};
use shortener::route::create_app;

/// Application entry point
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "data.db")
/// - `BASE_URL` - Public address used to build short links
/// - `AUTHORIZATION` - Optional shared secret for the `/api` routes
/// - `RUST_LOG` - Log filter
#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env();

    let store = RedbStore::open(&config.database_url).expect("Failed to initialize database");

    let addr = format!("0.0.0.0:{}", config.port);
    info!(database = %config.database_url, base_url = %config.base_url, "starting server");

    let app = create_app(AppState::new(store, config)).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&addr).await.expect("Failed to bind address");
    info!("listening on {}", addr);

    // The server keeps running until it receives SIGTERM or SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Resolves once SIGINT (Ctrl+C) or, on Unix, SIGTERM is received
///
/// In-flight requests are allowed to complete and open write transactions
/// are committed or dropped before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
