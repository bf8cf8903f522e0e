use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lru::LruCache;
use parking_lot::Mutex;

use crate::{config::Config, error::AppError};

use axum::extract::ConnectInfo;
use std::net::SocketAddr;

// 单个调用方的计数器，窗口从首次请求开始计时，到期整体作废
struct RateCounter {
    count: u32,
    expires_at: Instant,
}

/// IP 维度的请求限流器，计数器全部驻留内存
///
/// 跟踪的 key 数量有上限，超出后按 LRU 淘汰最久未活跃的调用方。
pub struct RateLimiter {
    counters: Mutex<LruCache<String, RateCounter>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &Config) -> Self {
        Self::with_limits(
            config.rate_limit_requests,
            config.rate_limit_window(),
            config.rate_limit_max_keys,
        )
    }

    pub fn with_limits(max_requests: u32, window: Duration, max_keys: usize) -> Self {
        let capacity = NonZeroUsize::new(max_keys.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            counters: Mutex::new(LruCache::new(capacity)),
            max_requests,
            window,
        }
    }

    /// 检查并累加计数；超限时返回距窗口重置的剩余秒数
    ///
    /// 读取、判断、累加全程持锁，多线程运行时下依然原子。
    pub fn check_and_increment(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        let mut counters = self.counters.lock();

        match counters.get_mut(key) {
            Some(counter) if counter.expires_at > now => {
                if counter.count >= self.max_requests {
                    let retry_after = counter.expires_at.duration_since(now).as_secs().max(1);
                    return Err(retry_after);
                }
                counter.count += 1;
            }
            // 无记录或窗口已过期，开启新窗口
            _ => {
                counters.put(
                    key.to_string(),
                    RateCounter {
                        count: 1,
                        expires_at: now + self.window,
                    },
                );
            }
        }

        Ok(())
    }
}

// 从请求头中获取IP，或者使用连接信息中的IP作为默认值
pub fn client_key(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or_else(|| remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&req);

    match limiter.check_and_increment(&key) {
        Ok(()) => next.run(req).await,
        Err(retry_after_secs) => {
            tracing::warn!("Rate limit exceeded for {}", key);
            AppError::RateLimited { retry_after_secs }.into_response()
        }
    }
}
