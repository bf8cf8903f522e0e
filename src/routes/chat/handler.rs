use axum::{
    extract::{Json, State, rejection::JsonRejection},
    response::IntoResponse,
};

use super::model::{ChatReply, ChatRequest};
use crate::AppState;
use crate::cache::cache_key;
use crate::error::AppError;

#[axum::debug_handler]
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::BadPayload(rejection.body_text()))?;

    req.validate()?;

    let Some(api_key) = state.config.upstream_api_key.as_deref() else {
        tracing::error!("UPSTREAM_API_KEY is not configured, rejecting chat request");
        return Err(AppError::MissingCredentials);
    };

    // 带图片的请求不走缓存，缓存键未覆盖图片内容
    let key = req
        .image
        .is_none()
        .then(|| cache_key(state.upstream.model(), req.system_prompt.as_deref(), &req.inputs));

    if let Some(key) = &key {
        if let Some(reply) = state.cache.get(key) {
            tracing::debug!("Reply cache hit");
            return Ok(Json(ChatReply { reply }));
        }
    }

    let messages = req.assemble_messages();
    let reply = state.upstream.complete(api_key, messages).await?;

    if let Some(key) = key {
        state.cache.insert(key, reply.clone());
    }

    Ok(Json(ChatReply { reply }))
}

// 仅注册了 POST，其余方法统一走这里返回结构化的 405
pub async fn method_not_allowed() -> impl IntoResponse {
    AppError::MethodNotAllowed
}
