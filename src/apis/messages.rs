use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

use super::ApiDefinition;
use crate::MESSAGES_PATH;

// Enum for the supported Messages-protocol APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessagesApi {
    Messages,
}

impl ApiDefinition for MessagesApi {
    fn endpoint(&self) -> &'static str {
        match self {
            MessagesApi::Messages => MESSAGES_PATH,
        }
    }

    fn from_endpoint(endpoint: &str) -> Option<Self> {
        match endpoint {
            MESSAGES_PATH => Some(MessagesApi::Messages),
            _ => None,
        }
    }

    fn supports_streaming(&self) -> bool {
        match self {
            MessagesApi::Messages => true,
        }
    }

    fn supports_tools(&self) -> bool {
        match self {
            MessagesApi::Messages => true,
        }
    }

    fn supports_vision(&self) -> bool {
        match self {
            MessagesApi::Messages => true,
        }
    }

    fn all_variants() -> Vec<Self> {
        vec![MessagesApi::Messages]
    }
}

/// An inbound Messages-style request.
///
/// Deserialization is deliberately lenient: identifier fields that the
/// request transformer validates (`tool_use.id`, `tool_result.tool_use_id`,
/// ...) are `Option` here so that a malformed block surfaces as a typed
/// transform error instead of a serde error. Unrecognized top-level fields
/// are ignored.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MessagesRequest {
    pub model: Option<String>,
    pub system: Option<MessagesSystemPrompt>,
    #[serde(default)]
    pub messages: Vec<MessagesMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub tools: Option<Vec<MessagesTool>>,
    pub tool_choice: Option<MessagesToolChoice>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessagesMessage {
    /// Free-form role string; passed through to the target protocol as-is.
    pub role: String,
    pub content: MessagesMessageContent,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum MessagesMessageContent {
    Single(String),
    Blocks(Vec<MessagesContentBlock>),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum MessagesSystemPrompt {
    Single(String),
    Blocks(Vec<MessagesContentBlock>),
}

/// Cache control marker carried by some content blocks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum MessagesCacheControl {
    Ephemeral,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum MessagesContentBlock {
    Text {
        #[serde(default)]
        text: String,
        cache_control: Option<MessagesCacheControl>,
    },
    Image {
        source: Option<MessagesImageSource>,
    },
    ToolUse {
        id: Option<String>,
        name: Option<String>,
        input: Option<Value>,
        cache_control: Option<MessagesCacheControl>,
    },
    ToolResult {
        tool_use_id: Option<String>,
        is_error: Option<bool>,
        content: Option<Value>,
        cache_control: Option<MessagesCacheControl>,
    },
    /// Fallback for block types this crate does not interpret. The
    /// transformer skips these with a diagnostic instead of failing.
    #[serde(untagged)]
    Unknown(Value),
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum MessagesImageSource {
    Base64 {
        media_type: Option<String>,
        #[serde(default)]
        data: String,
    },
    Url {
        #[serde(default)]
        url: String,
    },
    #[serde(untagged)]
    Unknown(Value),
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessagesTool {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
    /// Present on built-in server tools (e.g. the web-search built-in);
    /// absent on ordinary function tools.
    #[serde(rename = "type")]
    pub tool_type: Option<String>,
}

/// Tool choice is either a bare mode string or a typed object.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum MessagesToolChoice {
    Mode(String),
    Spec(MessagesToolChoiceSpec),
    Other(Value),
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessagesToolChoiceSpec {
    #[serde(rename = "type")]
    pub kind: MessagesToolChoiceKind,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessagesToolChoiceKind {
    Auto,
    Any,
    Tool,
}

// ============================================================================
// Response-direction shapes
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessagesRole {
    User,
    Assistant,
}

impl MessagesRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagesRole::User => "user",
            MessagesRole::Assistant => "assistant",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessagesStopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    Refusal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessagesUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessagesResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub obj_type: String,
    pub role: MessagesRole,
    pub content: Vec<MessagesContentBlock>,
    pub model: String,
    pub stop_reason: MessagesStopReason,
    pub stop_sequence: Option<String>,
    pub usage: MessagesUsage,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum MessagesStreamEvent {
    MessageStart {
        message: MessagesStreamMessage,
    },
    ContentBlockStart {
        index: u32,
        content_block: MessagesContentBlock,
    },
    ContentBlockDelta {
        index: u32,
        delta: MessagesContentDelta,
    },
    ContentBlockStop {
        index: u32,
    },
    MessageDelta {
        delta: MessagesMessageDelta,
        usage: MessagesUsage,
    },
    MessageStop,
    Ping,
}

impl MessagesStreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            MessagesStreamEvent::MessageStart { .. } => "message_start",
            MessagesStreamEvent::ContentBlockStart { .. } => "content_block_start",
            MessagesStreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            MessagesStreamEvent::ContentBlockStop { .. } => "content_block_stop",
            MessagesStreamEvent::MessageDelta { .. } => "message_delta",
            MessagesStreamEvent::MessageStop => "message_stop",
            MessagesStreamEvent::Ping => "ping",
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessagesStreamMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub obj_type: String,
    pub role: MessagesRole,
    pub content: Vec<Value>,
    pub model: String,
    pub stop_reason: Option<MessagesStopReason>,
    pub stop_sequence: Option<String>,
    pub usage: MessagesUsage,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum MessagesContentDelta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(rename = "input_json_delta")]
    InputJsonDelta { partial_json: String },
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessagesMessageDelta {
    pub stop_reason: MessagesStopReason,
    pub stop_sequence: Option<String>,
}

impl TryFrom<&[u8]> for MessagesRequest {
    type Error = serde_json::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_messages_required_fields() {
        let original_json = json!({
            "model": "sonnet-large",
            "messages": [
                {
                    "role": "user",
                    "content": "Hello"
                }
            ],
            "max_tokens": 100
        });

        let request: MessagesRequest = serde_json::from_value(original_json.clone()).unwrap();

        assert_eq!(request.model.as_deref(), Some("sonnet-large"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.max_tokens, Some(100));

        let message = &request.messages[0];
        assert_eq!(message.role, "user");
        if let MessagesMessageContent::Single(content) = &message.content {
            assert_eq!(content, "Hello");
        } else {
            panic!("Expected single content");
        }

        assert!(request.system.is_none());
        assert!(request.temperature.is_none());
        assert!(request.top_p.is_none());
        assert!(request.tools.is_none());
        assert!(request.tool_choice.is_none());

        let serialized = serde_json::to_value(&request).unwrap();
        assert_eq!(original_json, serialized);
    }

    #[test]
    fn test_messages_nested_content_blocks() {
        let original_json = json!({
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "Look at this"},
                        {
                            "type": "image",
                            "source": {"type": "base64", "media_type": "image/png", "data": "AAAA"}
                        }
                    ]
                },
                {
                    "role": "assistant",
                    "content": [
                        {
                            "type": "tool_use",
                            "id": "toolu_1",
                            "name": "get_weather",
                            "input": {"location": "Paris"}
                        }
                    ]
                },
                {
                    "role": "user",
                    "content": [
                        {"type": "tool_result", "tool_use_id": "toolu_1", "content": "rainy"}
                    ]
                }
            ]
        });

        let request: MessagesRequest = serde_json::from_value(original_json).unwrap();
        assert_eq!(request.messages.len(), 3);

        let MessagesMessageContent::Blocks(blocks) = &request.messages[0].content else {
            panic!("Expected blocks");
        };
        assert!(matches!(&blocks[0], MessagesContentBlock::Text { text, .. } if text == "Look at this"));
        let MessagesContentBlock::Image { source: Some(source) } = &blocks[1] else {
            panic!("Expected image with source");
        };
        assert!(
            matches!(source, MessagesImageSource::Base64 { media_type, data }
                if media_type.as_deref() == Some("image/png") && data == "AAAA")
        );

        let MessagesMessageContent::Blocks(blocks) = &request.messages[1].content else {
            panic!("Expected blocks");
        };
        let MessagesContentBlock::ToolUse { id, name, input, .. } = &blocks[0] else {
            panic!("Expected tool_use");
        };
        assert_eq!(id.as_deref(), Some("toolu_1"));
        assert_eq!(name.as_deref(), Some("get_weather"));
        assert_eq!(input.as_ref().unwrap()["location"], "Paris");

        let MessagesMessageContent::Blocks(blocks) = &request.messages[2].content else {
            panic!("Expected blocks");
        };
        let MessagesContentBlock::ToolResult { tool_use_id, content, .. } = &blocks[0] else {
            panic!("Expected tool_result");
        };
        assert_eq!(tool_use_id.as_deref(), Some("toolu_1"));
        assert_eq!(content.as_ref().unwrap(), &json!("rainy"));
    }

    #[test]
    fn test_malformed_tool_use_still_parses() {
        // Missing id/name is a transform-time error, not a parse error.
        let block: MessagesContentBlock =
            serde_json::from_value(json!({"type": "tool_use", "input": {"q": "x"}})).unwrap();
        let MessagesContentBlock::ToolUse { id, name, .. } = block else {
            panic!("Expected tool_use");
        };
        assert!(id.is_none());
        assert!(name.is_none());
    }

    #[test]
    fn test_unknown_block_type_falls_back() {
        let block: MessagesContentBlock =
            serde_json::from_value(json!({"type": "thinking", "thinking": "hmm"})).unwrap();
        let MessagesContentBlock::Unknown(value) = block else {
            panic!("Expected unknown fallback");
        };
        assert_eq!(value["type"], "thinking");
    }

    #[test]
    fn test_unknown_image_source_falls_back() {
        let source: MessagesImageSource =
            serde_json::from_value(json!({"type": "file", "file_id": "f_1"})).unwrap();
        assert!(matches!(source, MessagesImageSource::Unknown(_)));
    }

    #[test]
    fn test_tool_choice_forms() {
        let choice: MessagesToolChoice = serde_json::from_value(json!("auto")).unwrap();
        assert!(matches!(choice, MessagesToolChoice::Mode(mode) if mode == "auto"));

        let choice: MessagesToolChoice =
            serde_json::from_value(json!({"type": "tool", "name": "search"})).unwrap();
        let MessagesToolChoice::Spec(spec) = choice else {
            panic!("Expected spec");
        };
        assert_eq!(spec.kind, MessagesToolChoiceKind::Tool);
        assert_eq!(spec.name.as_deref(), Some("search"));

        // Unrecognized object kinds are tolerated at parse time.
        let choice: MessagesToolChoice =
            serde_json::from_value(json!({"type": "none"})).unwrap();
        assert!(matches!(choice, MessagesToolChoice::Other(_)));
    }

    #[test]
    fn test_system_prompt_forms() {
        let system: MessagesSystemPrompt = serde_json::from_value(json!("be brief")).unwrap();
        assert!(matches!(system, MessagesSystemPrompt::Single(text) if text == "be brief"));

        let system: MessagesSystemPrompt =
            serde_json::from_value(json!([{"type": "text", "text": "be brief"}])).unwrap();
        assert!(matches!(system, MessagesSystemPrompt::Blocks(blocks) if blocks.len() == 1));
    }

    #[test]
    fn test_response_round_trip() {
        let original_json = json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Hi there"}],
            "model": "sonnet-large",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 4}
        });

        let response: MessagesResponse = serde_json::from_value(original_json.clone()).unwrap();
        assert_eq!(response.role, MessagesRole::Assistant);
        assert_eq!(response.stop_reason, MessagesStopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 10);

        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(original_json, serialized);
    }

    #[test]
    fn test_stream_event_round_trip() {
        let original_json = json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": " How"}
        });

        let event: MessagesStreamEvent = serde_json::from_value(original_json.clone()).unwrap();
        assert_eq!(event.event_type(), "content_block_delta");

        let serialized = serde_json::to_value(&event).unwrap();
        assert_eq!(original_json, serialized);
    }
}
