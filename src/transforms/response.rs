//! Chat-Completions-protocol response → Messages-protocol response.

use serde_json::Value;

use crate::apis::chat_completions::{
    ChatCompletionsResponse, ChatMessage, ChatMessageContent, ContentPart, FinishReason,
    ImageUrl,
};
use crate::apis::messages::{
    MessagesContentBlock, MessagesImageSource, MessagesResponse, MessagesRole,
    MessagesStopReason, MessagesUsage,
};
use crate::error::TransformError;

impl TryFrom<ChatCompletionsResponse> for MessagesResponse {
    type Error = TransformError;

    fn try_from(resp: ChatCompletionsResponse) -> Result<Self, Self::Error> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TransformError::MissingField("choices".to_string()))?;

        let content = convert_chat_message_content(&choice.message)?;
        let stop_reason = choice
            .finish_reason
            .map(Into::into)
            .unwrap_or(MessagesStopReason::EndTurn);

        Ok(MessagesResponse {
            id: resp.id,
            obj_type: "message".to_string(),
            role: MessagesRole::Assistant,
            content,
            model: resp.model,
            stop_reason,
            stop_sequence: None,
            usage: MessagesUsage {
                input_tokens: resp.usage.prompt_tokens,
                output_tokens: resp.usage.completion_tokens,
            },
        })
    }
}

impl From<FinishReason> for MessagesStopReason {
    fn from(reason: FinishReason) -> Self {
        match reason {
            FinishReason::Stop => MessagesStopReason::EndTurn,
            FinishReason::Length => MessagesStopReason::MaxTokens,
            FinishReason::ToolCalls | FinishReason::FunctionCall => MessagesStopReason::ToolUse,
            FinishReason::ContentFilter => MessagesStopReason::Refusal,
        }
    }
}

/// Convert an assistant chat message into Messages-protocol content blocks:
/// text first, then one `tool_use` block per tool call.
fn convert_chat_message_content(
    message: &ChatMessage,
) -> Result<Vec<MessagesContentBlock>, TransformError> {
    let mut blocks = Vec::new();

    match &message.content {
        ChatMessageContent::Text(text) => {
            if !text.is_empty() {
                blocks.push(MessagesContentBlock::Text {
                    text: text.clone(),
                    cache_control: None,
                });
            }
        }
        ChatMessageContent::Parts(parts) => {
            for part in parts {
                match part {
                    ContentPart::Text { text } => blocks.push(MessagesContentBlock::Text {
                        text: text.clone(),
                        cache_control: None,
                    }),
                    ContentPart::ImageUrl { image_url } => {
                        blocks.push(MessagesContentBlock::Image {
                            source: Some(convert_image_url_to_source(image_url)),
                        })
                    }
                }
            }
        }
        ChatMessageContent::Null => {}
    }

    if let Some(tool_calls) = &message.tool_calls {
        for call in tool_calls {
            let input: Value = if call.function.arguments.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                serde_json::from_str(&call.function.arguments)?
            };
            blocks.push(MessagesContentBlock::ToolUse {
                id: Some(call.id.clone()),
                name: Some(call.function.name.clone()),
                input: Some(input),
                cache_control: None,
            });
        }
    }

    Ok(blocks)
}

/// Undo the data-URI encoding applied on the request path; non-data URLs map
/// back to a url source.
fn convert_image_url_to_source(image_url: &ImageUrl) -> MessagesImageSource {
    if let Some(rest) = image_url.url.strip_prefix("data:") {
        if let Some((header, data)) = rest.split_once(',') {
            let media_type = header.split(';').next().unwrap_or_default();
            return MessagesImageSource::Base64 {
                media_type: (!media_type.is_empty()).then(|| media_type.to_string()),
                data: data.to_string(),
            };
        }
    }
    MessagesImageSource::Url {
        url: image_url.url.clone(),
    }
}
