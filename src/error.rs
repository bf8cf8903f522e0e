use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    MethodNotAllowed,
    BadPayload(String),
    EmptyInputs,
    InvalidImage,
    ImageTooLarge,
    RateLimited { retry_after_secs: u64 },
    MissingCredentials,
    Upstream { status: u16, details: Option<String> },
    Timeout,
    Transport,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "仅支持 POST 请求".to_string(),
                None,
            ),
            AppError::BadPayload(detail) => (
                StatusCode::BAD_REQUEST,
                "请求格式错误".to_string(),
                Some(detail),
            ),
            AppError::EmptyInputs => (
                StatusCode::BAD_REQUEST,
                "请求内容不能为空".to_string(),
                None,
            ),
            AppError::InvalidImage => {
                (StatusCode::BAD_REQUEST, "图片编码无效".to_string(), None)
            }
            AppError::ImageTooLarge => (
                StatusCode::BAD_REQUEST,
                "图片大小超过 2MB 限制".to_string(),
                None,
            ),
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("请求过于频繁，请在{}秒后重试", retry_after_secs),
                None,
            ),
            AppError::MissingCredentials => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "服务配置错误，请联系管理员".to_string(),
                None,
            ),
            // 上游状态码原样透传
            AppError::Upstream { status, details } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "上游服务返回错误".to_string(),
                details,
            ),
            AppError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "上游服务响应超时，请稍后重试".to_string(),
                None,
            ),
            AppError::Transport => (
                StatusCode::BAD_GATEWAY,
                "连接上游服务失败".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse { error, details });

        (status, body).into_response()
    }
}
