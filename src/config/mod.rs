use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub upstream_api_url: String,
    pub upstream_api_key: Option<String>,
    pub upstream_model: String,
    pub upstream_max_tokens: u32,
    pub upstream_temperature: f32,
    pub upstream_top_p: f32,
    pub upstream_timeout_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_max_keys: usize,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")
                .unwrap_or_default()
                .parse()
                .unwrap_or(3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            upstream_api_url: env::var("UPSTREAM_API_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1/chat/completions".into()),
            // 密钥缺失不阻止启动，请求阶段单独报告配置错误
            upstream_api_key: env::var("UPSTREAM_API_KEY").ok().filter(|k| !k.is_empty()),
            upstream_model: env::var("UPSTREAM_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4o-mini".into()),
            upstream_max_tokens: env::var("UPSTREAM_MAX_TOKENS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(800),
            upstream_temperature: env::var("UPSTREAM_TEMPERATURE")
                .unwrap_or_default()
                .parse()
                .unwrap_or(0.7),
            upstream_top_p: env::var("UPSTREAM_TOP_P")
                .unwrap_or_default()
                .parse()
                .unwrap_or(0.95),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(60),
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW")
                .unwrap_or_default()
                .parse()
                .unwrap_or(60),
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(10),
            rate_limit_max_keys: env::var("RATE_LIMIT_MAX_KEYS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(1024),
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(600),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .unwrap_or_default()
                .parse()
                .unwrap_or(128),
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
