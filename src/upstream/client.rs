use crate::config::Config;
use crate::error::AppError;

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

// 记录上游错误详情时的截断长度
const DETAIL_LIMIT: usize = 500;

/// 上游 chat/completions 服务的客户端
///
/// 每个入站请求只发起一次上游调用，失败不重试；超时由
/// reqwest 客户端统一施加。
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self {
            http,
            url: config.upstream_api_url.clone(),
            model: config.upstream_model.clone(),
            max_tokens: config.upstream_max_tokens,
            temperature: config.upstream_temperature,
            top_p: config.upstream_top_p,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 转发消息列表并取回首个补全的文本
    pub async fn complete(
        &self,
        api_key: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, AppError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!("Upstream request timed out: {}", self.url);
                    AppError::Timeout
                } else {
                    tracing::error!("Upstream request failed: {}", e);
                    AppError::Transport
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            tracing::error!("Upstream returned {}: {}", status, raw);
            return Err(AppError::Upstream {
                status: status.as_u16(),
                details: extract_error_detail(&raw),
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!("Upstream response body timed out: {}", self.url);
                return AppError::Timeout;
            }
            tracing::error!("Failed to parse upstream response: {}", e);
            AppError::Upstream {
                status: status.as_u16(),
                details: Some("上游返回了无法解析的响应".to_string()),
            }
        })?;

        Ok(completion.reply_text())
    }
}

// 从上游错误响应中提取可透出的描述
// 依次尝试 {"error": "..."}、{"error": {"message": "..."}}、{"message": "..."}，
// 都不匹配时回退到截断后的原始响应体
pub(crate) fn extract_error_detail(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(err) = value.get("error") {
            if let Some(s) = err.as_str() {
                return Some(truncate(s));
            }
            if let Some(msg) = err.get("message").and_then(|m| m.as_str()) {
                return Some(truncate(msg));
            }
            return Some(truncate(&err.to_string()));
        }
        if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
            return Some(truncate(msg));
        }
    }

    Some(truncate(raw))
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= DETAIL_LIMIT {
        s.to_string()
    } else {
        s.chars().take(DETAIL_LIMIT).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_error_string() {
        assert_eq!(
            extract_error_detail(r#"{"error":"boom"}"#),
            Some("boom".to_string())
        );
    }

    #[test]
    fn test_detail_from_error_object() {
        assert_eq!(
            extract_error_detail(r#"{"error":{"message":"quota exceeded","code":429}}"#),
            Some("quota exceeded".to_string())
        );
    }

    #[test]
    fn test_detail_from_top_level_message() {
        assert_eq!(
            extract_error_detail(r#"{"message":"bad gateway"}"#),
            Some("bad gateway".to_string())
        );
    }

    #[test]
    fn test_detail_falls_back_to_raw_body() {
        assert_eq!(
            extract_error_detail("<html>502</html>"),
            Some("<html>502</html>".to_string())
        );
        assert_eq!(extract_error_detail("   "), None);
    }

    #[test]
    fn test_detail_is_truncated() {
        let long = "x".repeat(DETAIL_LIMIT * 2);
        let detail = extract_error_detail(&long).unwrap();
        assert_eq!(detail.chars().count(), DETAIL_LIMIT);
    }
}
