//! Route definitions for the link shortener
//!
//! This module maps HTTP routes to their handlers and attaches the
//! application state.

use axum::routing::{get, patch};
use axum::{middleware, Router};

use crate::database::AppState;
use crate::handler::{
    create_short_url, delete_short_url, landing, list_urls, redirect_url, update_short_url,
    user_stats,
};
use crate::middleware::auth_middleware;

/// Creates and configures the application router
///
/// # Route Definitions
///
/// - `GET /` - Landing page, explains `?error=` after a failed redirect
/// - `GET /{code}` - Redirects a visitor (public endpoint)
/// - `GET /api/urls` - Lists the caller's links with pagination
/// - `POST /api/urls` - Creates a new short link
/// - `PATCH /api/urls/{id}` - Updates link metadata
/// - `DELETE /api/urls/{id}` - Deletes a link
/// - `GET /api/stats` - Dashboard statistics
///
/// # Example Usage
///
/// ```no_run
/// # use shortener::config::Config;
/// # use shortener::database::{AppState, RedbStore};
/// # use shortener::route::create_app;
/// let store = RedbStore::open("data.db").unwrap();
/// let app = create_app(AppState::new(store, Config::default()));
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/urls", get(list_urls).post(create_short_url))
        .route("/urls/{id}", patch(update_short_url).delete(delete_short_url))
        .route("/stats", get(user_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(landing))
        .route("/{code}", get(redirect_url))
        .nest("/api", api_routes)
        .with_state(state)
}
