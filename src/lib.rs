//! janusllm: a library for translating LLM API requests and responses
//! between the Messages and Chat Completions protocol formats.

pub mod apis;
pub mod error;
pub mod transforms;

// Re-export important types and functions
pub use apis::{
    ApiDefinition, ChatCompletionsApi, ChatCompletionsRequest, ChatCompletionsResponse,
    ChatCompletionsStreamResponse, MessagesApi, MessagesRequest, MessagesResponse,
    MessagesStreamEvent, SupportedApis,
};
pub use error::TransformError;
pub use transforms::{
    transform_count_tokens_request, transform_messages_request, transform_request,
};

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const MESSAGES_PATH: &str = "/v1/messages";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_detection() {
        assert!(SupportedApis::from_endpoint(CHAT_COMPLETIONS_PATH).is_some());
        assert!(SupportedApis::from_endpoint(MESSAGES_PATH).is_some());
        assert!(SupportedApis::from_endpoint("/v1/unknown").is_none());
    }

    #[test]
    fn test_transform_round_trip_through_wire_bytes() {
        // A request arriving as bytes, transformed, and serialized back out.
        let body = json!({
            "model": "sonnet-large",
            "system": "You are helpful",
            "messages": [
                {"role": "user", "content": "What's the weather in Paris?"},
                {
                    "role": "assistant",
                    "content": [
                        {"type": "tool_use", "id": "t1", "name": "get_weather",
                         "input": {"location": "Paris"}}
                    ]
                },
                {
                    "role": "user",
                    "content": [
                        {"type": "tool_result", "tool_use_id": "t1", "content": "rainy"}
                    ]
                }
            ],
            "max_tokens": 1024,
            "tools": [{
                "name": "get_weather",
                "description": "Current weather for a location",
                "input_schema": {"type": "object", "properties": {"location": {"type": "string"}}}
            }]
        });

        let out = transform_request("gpt-large", &body, false).unwrap();
        let wire = serde_json::to_value(&out).unwrap();

        assert_eq!(wire["model"], "gpt-large");
        let messages = wire["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4); // system + user + tool call + tool result
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["content"], json!(null));
        assert_eq!(messages[2]["tool_calls"][0]["id"], "t1");
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "t1");
        assert_eq!(wire["tools"].as_array().unwrap().len(), 1);
    }
}
