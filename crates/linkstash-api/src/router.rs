use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, health, links};

/// All `/api` routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/auth/check/{username}", get(auth::check_username))
        .route("/api/health", get(health::health));

    let protected_routes = Router::new()
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/links",
            get(links::list_links)
                .post(links::add_link)
                .delete(links::delete_link),
        )
        .route("/api/links/mark-read", post(links::mark_read))
        .route("/api/links/toggle-favorite", post(links::toggle_favorite))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
