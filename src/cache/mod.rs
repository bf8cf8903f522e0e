use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

// 缓存相关常量
const CACHE_KEY_LIMIT: usize = 512; // 缓存键截断长度，防止超长输入占满内存

struct CacheEntry {
    reply: String,
    expires_at: Instant,
}

/// 回复缓存：容量有限，LRU 淘汰，条目独立过期
///
/// 尽力而为的优化层，未命中不算错误；只有成功的上游回复才会写入。
pub struct ReplyCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl ReplyCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.reply.clone()),
            // 过期条目顺手移除
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, reply: String) {
        let entry = CacheEntry {
            reply,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().put(key, entry);
    }
}

/// 缓存键：模型、系统提示和用户输入的拼接，截断到固定长度
pub fn cache_key(model: &str, system_prompt: Option<&str>, inputs: &str) -> String {
    let raw = format!(
        "{}|{}|{}",
        model,
        system_prompt.map(str::trim).unwrap_or(""),
        inputs.trim()
    );

    if raw.chars().count() <= CACHE_KEY_LIMIT {
        raw
    } else {
        raw.chars().take(CACHE_KEY_LIMIT).collect()
    }
}
