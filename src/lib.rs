use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod upstream;

use cache::ReplyCache;
use config::Config;
use middleware::{RateLimiter, log_errors, rate_limit};
use upstream::UpstreamClient;

// 请求体上限。2MB 的图片经 base64 编码后约 2.8MB，需留出余量
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
    pub cache: Arc<ReplyCache>,
}

pub fn app(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    let api_routes = Router::new()
        .route(
            "/chat",
            post(routes::chat::ask).fallback(routes::chat::method_not_allowed),
        )
        .route("/ping", get(routes::ping::ping));

    Router::new()
        .nest(&state.config.api_base_uri, api_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            rate_limit,
        ))
        .with_state(state)
}
