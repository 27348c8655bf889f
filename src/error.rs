use thiserror::Error;

/// Errors raised while translating between the Messages and Chat Completions
/// protocols. Fatal validation errors abort the whole transformation; there is
/// no partial output.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("target model must be a non-empty string")]
    InvalidModel,

    #[error("request body must be a JSON object: {0}")]
    InvalidRequest(String),

    #[error("`messages` must be a non-empty array")]
    EmptyMessages,

    #[error("tool_use block in message {index} is missing `{field}`")]
    MalformedToolUse { index: usize, field: &'static str },

    #[error("tool_result block in message {index} is missing `tool_use_id`")]
    MalformedToolResult { index: usize },

    #[error("missing field: {0}")]
    MissingField(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
