use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::upstream::{ChatMessage, ContentPart, ImageUrl, MessageContent};

pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024; // 图片解码后的字节上限

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    pub inputs: String,
    pub image: Option<String>,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

impl ChatRequest {
    /// 校验输入，任何失败都发生在上游调用之前
    pub fn validate(&self) -> Result<(), AppError> {
        if self.inputs.trim().is_empty() {
            return Err(AppError::EmptyInputs);
        }

        if let Some(image) = &self.image {
            if decoded_image_size(image)? > MAX_IMAGE_BYTES {
                return Err(AppError::ImageTooLarge);
            }
        }

        Ok(())
    }

    /// 组装发往上游的消息列表
    ///
    /// 系统提示非空白时置于首位；用户消息有且仅有一条。未提供系统
    /// 提示时不注入任何默认值，保持模型的中立行为。
    pub fn assemble_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);

        if let Some(prompt) = self
            .system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            messages.push(ChatMessage::system(prompt.to_string()));
        }

        let text = self.inputs.trim().to_string();
        let content = match &self.image {
            Some(image) => MessageContent::Parts(vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: image.clone() },
                },
            ]),
            None => MessageContent::Text(text),
        };
        messages.push(ChatMessage::user(content));

        messages
    }
}

// data URL 前缀之后才是 base64 数据
fn decoded_image_size(image: &str) -> Result<usize, AppError> {
    let data = image
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(image)
        .trim();

    // 先按编码长度估算，超限的大体积负载不做完整解码
    let estimated = data.len() / 4 * 3;
    if estimated > MAX_IMAGE_BYTES + 2 {
        return Ok(estimated);
    }

    let bytes = STANDARD.decode(data).map_err(|_| AppError::InvalidImage)?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(inputs: &str, image: Option<&str>, system_prompt: Option<&str>) -> ChatRequest {
        ChatRequest {
            inputs: inputs.to_string(),
            image: image.map(str::to_string),
            system_prompt: system_prompt.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert_eq!(
            request("", None, None).validate(),
            Err(AppError::EmptyInputs)
        );
        assert_eq!(
            request("   \n\t", None, None).validate(),
            Err(AppError::EmptyInputs)
        );
        assert!(request("Привет", None, None).validate().is_ok());
    }

    #[test]
    fn test_image_within_limit_accepted() {
        let image = format!(
            "data:image/png;base64,{}",
            STANDARD.encode(vec![0u8; 1024])
        );
        assert!(request("Что на фото?", Some(&image), None).validate().is_ok());
    }

    #[test]
    fn test_oversized_image_rejected() {
        let image = STANDARD.encode(vec![0u8; MAX_IMAGE_BYTES + 1]);
        assert_eq!(
            request("Что на фото?", Some(&image), None).validate(),
            Err(AppError::ImageTooLarge)
        );
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert_eq!(
            request("Привет", Some("data:image/png;base64,@@@@"), None).validate(),
            Err(AppError::InvalidImage)
        );
    }

    /// 未提供系统提示时，消息列表只含一条 user 消息
    #[test]
    fn test_no_system_prompt_is_injected() {
        for system_prompt in [None, Some(""), Some("   ")] {
            let messages = request("Привет", None, system_prompt).assemble_messages();
            assert_eq!(
                messages,
                vec![ChatMessage::user(MessageContent::Text(
                    "Привет".to_string()
                ))]
            );
        }
    }

    #[test]
    fn test_system_prompt_comes_first() {
        let messages = request("Привет", None, Some("Ты эксперт")).assemble_messages();
        assert_eq!(
            messages,
            vec![
                ChatMessage::system("Ты эксперт".to_string()),
                ChatMessage::user(MessageContent::Text("Привет".to_string())),
            ]
        );
    }

    #[test]
    fn test_image_becomes_composite_user_content() {
        let image = "data:image/png;base64,AAAA";
        let messages = request("Что на фото?", Some(image), None).assemble_messages();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(
            messages[0].content,
            MessageContent::Parts(vec![
                ContentPart::Text {
                    text: "Что на фото?".to_string()
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.to_string()
                    }
                },
            ])
        );
    }
}
