pub mod chat_completions;
pub mod messages;

// Explicit exports to avoid naming conflicts
pub use chat_completions::{
    ChatCompletionsApi, ChatCompletionsRequest, ChatCompletionsResponse,
    ChatCompletionsStreamResponse,
};
pub use messages::{MessagesApi, MessagesRequest, MessagesResponse, MessagesStreamEvent};

pub trait ApiDefinition {
    /// Returns the endpoint path for this API
    fn endpoint(&self) -> &'static str;

    /// Creates an API instance from an endpoint path
    fn from_endpoint(endpoint: &str) -> Option<Self>
    where
        Self: Sized;

    /// Returns whether this API supports streaming responses
    fn supports_streaming(&self) -> bool;

    /// Returns whether this API supports tool/function calling
    fn supports_tools(&self) -> bool;

    /// Returns whether this API supports vision/image processing
    fn supports_vision(&self) -> bool;

    /// Returns all variants of this API enum
    fn all_variants() -> Vec<Self>
    where
        Self: Sized;
}

/// Unified enum representing the endpoints this crate translates between.
#[derive(Debug, Clone, PartialEq)]
pub enum SupportedApis {
    ChatCompletions(ChatCompletionsApi),
    Messages(MessagesApi),
}

impl SupportedApis {
    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        if let Some(api) = ChatCompletionsApi::from_endpoint(endpoint) {
            return Some(SupportedApis::ChatCompletions(api));
        }

        if let Some(api) = MessagesApi::from_endpoint(endpoint) {
            return Some(SupportedApis::Messages(api));
        }

        None
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            SupportedApis::ChatCompletions(api) => api.endpoint(),
            SupportedApis::Messages(api) => api.endpoint(),
        }
    }
}

impl std::fmt::Display for SupportedApis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupportedApis::ChatCompletions(api) => {
                write!(f, "Chat Completions API ({})", api.endpoint())
            }
            SupportedApis::Messages(api) => write!(f, "Messages API ({})", api.endpoint()),
        }
    }
}

/// Get all supported endpoint paths
pub fn supported_endpoints() -> Vec<&'static str> {
    let mut endpoints = Vec::new();

    for api in ChatCompletionsApi::all_variants() {
        endpoints.push(api.endpoint());
    }

    for api in MessagesApi::all_variants() {
        endpoints.push(api.endpoint());
    }

    endpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CHAT_COMPLETIONS_PATH, MESSAGES_PATH};

    #[test]
    fn test_api_detection_from_endpoints() {
        assert_eq!(
            SupportedApis::from_endpoint("/v1/chat/completions"),
            Some(SupportedApis::ChatCompletions(
                ChatCompletionsApi::ChatCompletions
            ))
        );
        assert_eq!(
            SupportedApis::from_endpoint("/v1/messages"),
            Some(SupportedApis::Messages(MessagesApi::Messages))
        );
        assert_eq!(SupportedApis::from_endpoint("/v1/unknown"), None);
        assert_eq!(SupportedApis::from_endpoint(""), None);
    }

    #[test]
    fn test_supported_endpoints() {
        let endpoints = supported_endpoints();
        assert_eq!(endpoints.len(), 2);
        assert!(endpoints.contains(&CHAT_COMPLETIONS_PATH));
        assert!(endpoints.contains(&MESSAGES_PATH));
    }

    #[test]
    fn test_capability_flags() {
        fn check<T: ApiDefinition>(api: &T) {
            assert!(api.endpoint().starts_with('/'));
            assert!(api.supports_streaming());
            assert!(api.supports_tools());
            assert!(api.supports_vision());
        }

        check(&ChatCompletionsApi::ChatCompletions);
        check(&MessagesApi::Messages);
    }
}
