use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use assistant_backend::{
    AppState, app,
    cache::ReplyCache,
    config::Config,
    middleware::RateLimiter,
    upstream::UpstreamClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    if config.upstream_api_key.is_none() {
        tracing::warn!("UPSTREAM_API_KEY is not set, chat requests will be rejected");
    }

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 上游客户端与进程内共享状态
    let upstream = UpstreamClient::new(&config).expect("Failed to create upstream client");
    let cache = Arc::new(ReplyCache::new(config.cache_max_entries, config.cache_ttl()));

    let state = AppState {
        config: config.clone(),
        upstream,
        cache,
    };

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::new(&config));

    let router = app(state.clone(), rate_limiter);

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        let cors = tower_http::cors::CorsLayer::permissive();
        router.layer(cors)
    };

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
