pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::logging;
use crate::routes::{
    cache as cache_routes, conversations, health, members, messages, threads,
};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Threads
        .route(
            "/threads",
            get(threads::list_threads).post(threads::create_thread),
        )
        .route(
            "/threads/:thread_id",
            get(threads::get_thread)
                .put(threads::update_thread)
                .delete(threads::delete_thread),
        )
        // Conversations
        .route(
            "/threads/:thread_id/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        // Membership
        .route(
            "/threads/:thread_id/members",
            get(members::list_members).post(members::add_member),
        )
        .route("/threads/:thread_id/join", post(members::join_thread))
        .route("/threads/:thread_id/leave", post(members::leave_thread))
        // Messages
        .route(
            "/conversations/:conversation_id/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        // Cache passthrough
        .route(
            "/cache",
            get(cache_routes::get_cached).post(cache_routes::set_cached),
        );

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs.max(1));

    api_routes
        .layer(axum_middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}
