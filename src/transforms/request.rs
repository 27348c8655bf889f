//! Messages-protocol request → Chat-Completions-protocol request.
//!
//! The transformation is pure and synchronous: one source request in, one
//! target request out, diagnostics on the `log` facade as the only side
//! channel. Fatal validation errors abort the whole transformation.

use log::{debug, log_enabled, warn, Level};
use serde_json::Value;

use crate::apis::chat_completions::{
    ChatCompletionsRequest, ChatMessage, ChatMessageContent, ContentPart, Function,
    FunctionCall, FunctionChoice, ImageUrl, Tool, ToolCall, ToolChoice,
};
use crate::apis::messages::{
    MessagesContentBlock, MessagesImageSource, MessagesMessageContent, MessagesRequest,
    MessagesSystemPrompt, MessagesTool, MessagesToolChoice, MessagesToolChoiceKind,
};
use crate::error::TransformError;

/// Tools whose `type` carries this prefix are hosted built-ins (the
/// web-search tool and its dated revisions); they have no function-call
/// equivalent on the target protocol and are dropped.
pub const WEB_SEARCH_TOOL_PREFIX: &str = "web_search";

/// Media type assumed for base64 image sources that do not declare one.
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Transform a raw Messages-style request body into a Chat-Completions
/// request targeting `model`.
///
/// `stream_requested` is the caller's streaming intent; it is overridden to
/// `false` for count-tokens probes (`max_tokens == 0`), which must not use
/// streaming semantics.
pub fn transform_request(
    model: &str,
    body: &Value,
    stream_requested: bool,
) -> Result<ChatCompletionsRequest, TransformError> {
    if model.is_empty() {
        return Err(TransformError::InvalidModel);
    }
    let request = parse_request_body(body)?;
    transform_inner(model, &request, stream_requested, false)
}

/// Like [`transform_request`], but flags the request as a count-tokens probe
/// regardless of its `max_tokens` value. Probes never stream.
pub fn transform_count_tokens_request(
    model: &str,
    body: &Value,
) -> Result<ChatCompletionsRequest, TransformError> {
    if model.is_empty() {
        return Err(TransformError::InvalidModel);
    }
    let request = parse_request_body(body)?;
    transform_inner(model, &request, false, true)
}

/// Typed entry point for callers that already hold a [`MessagesRequest`].
pub fn transform_messages_request(
    model: &str,
    request: &MessagesRequest,
    stream_requested: bool,
) -> Result<ChatCompletionsRequest, TransformError> {
    transform_inner(model, request, stream_requested, false)
}

fn parse_request_body(body: &Value) -> Result<MessagesRequest, TransformError> {
    let Some(map) = body.as_object() else {
        return Err(TransformError::InvalidRequest(format!(
            "expected an object, got {}",
            json_kind(body)
        )));
    };

    match map.get("messages") {
        Some(Value::Array(items)) if !items.is_empty() => {}
        _ => return Err(TransformError::EmptyMessages),
    }

    serde_json::from_value(body.clone())
        .map_err(|e| TransformError::InvalidRequest(e.to_string()))
}

fn transform_inner(
    model: &str,
    request: &MessagesRequest,
    stream_requested: bool,
    count_tokens_override: bool,
) -> Result<ChatCompletionsRequest, TransformError> {
    if model.is_empty() {
        return Err(TransformError::InvalidModel);
    }
    if request.messages.is_empty() {
        return Err(TransformError::EmptyMessages);
    }

    let probe = count_tokens_override || request.max_tokens == Some(0);
    if probe {
        debug!("count-tokens probe: forcing stream=false");
    }

    let mut messages: Vec<ChatMessage> = Vec::new();

    if let Some(system) = &request.system {
        let folded = fold_system_prompt(system);
        if !folded.is_empty() {
            messages.push(ChatMessage::text("system", folded));
        }
    }

    for (index, message) in request.messages.iter().enumerate() {
        match &message.content {
            MessagesMessageContent::Single(text) => {
                messages.push(ChatMessage::text(message.role.clone(), text.clone()));
            }
            MessagesMessageContent::Blocks(blocks) => {
                convert_block_turn(&message.role, blocks, index, &mut messages)?;
            }
        }
    }

    let tools = request.tools.as_deref().map(convert_tools).filter(|tools| {
        if tools.is_empty() {
            debug!("no function tools left after filtering built-ins; omitting `tools`");
            false
        } else {
            true
        }
    });

    let tool_choice = request.tool_choice.as_ref().and_then(convert_tool_choice);

    // Zero only ever appears on a probe; the target protocol rejects it.
    let max_tokens = match request.max_tokens {
        Some(0) => Some(1),
        other => other,
    };

    let out = ChatCompletionsRequest {
        model: model.to_string(),
        messages,
        tools,
        tool_choice,
        max_tokens,
        temperature: request.temperature,
        top_p: request.top_p,
        stream: Some(stream_requested && !probe),
    };

    if log_enabled!(Level::Debug) {
        debug!(
            "transformed request for `{}`: {} message(s), {} tool(s), stream={:?}",
            model,
            out.messages.len(),
            out.tools.as_ref().map_or(0, Vec::len),
            out.stream
        );
    }

    Ok(out)
}

/// Fold a system prompt into a single string: text segments concatenate in
/// order with no separator, non-text segments contribute nothing.
fn fold_system_prompt(system: &MessagesSystemPrompt) -> String {
    match system {
        MessagesSystemPrompt::Single(text) => text.clone(),
        MessagesSystemPrompt::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                MessagesContentBlock::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect(),
    }
}

/// One step of the per-turn fold: a block either joins the pending plain
/// content, forces an immediate emission, or is skipped.
enum BlockStep {
    Accumulate(ContentPart),
    ToolCall(ToolCall),
    ToolOutput {
        tool_call_id: String,
        content: String,
    },
    Skip,
}

/// Walk one turn's content blocks in order, flushing pending plain content
/// before every tool block so tool-call semantics never merge into prose.
/// Each `tool_use` becomes its own single-call assistant turn; each
/// `tool_result` becomes its own `"tool"`-role turn.
fn convert_block_turn(
    role: &str,
    blocks: &[MessagesContentBlock],
    index: usize,
    out: &mut Vec<ChatMessage>,
) -> Result<(), TransformError> {
    let mut pending: Vec<ContentPart> = Vec::new();
    let mut saw_tool_block = false;

    for block in blocks {
        match classify_block(block, index)? {
            BlockStep::Accumulate(part) => pending.push(part),
            BlockStep::ToolCall(call) => {
                saw_tool_block = true;
                flush_pending(role, &mut pending, out);
                out.push(ChatMessage {
                    role: "assistant".to_string(),
                    content: ChatMessageContent::Null,
                    tool_calls: Some(vec![call]),
                    tool_call_id: None,
                    name: None,
                });
            }
            BlockStep::ToolOutput {
                tool_call_id,
                content,
            } => {
                saw_tool_block = true;
                flush_pending(role, &mut pending, out);
                out.push(ChatMessage {
                    role: "tool".to_string(),
                    content: ChatMessageContent::Text(content),
                    tool_calls: None,
                    tool_call_id: Some(tool_call_id),
                    name: None,
                });
            }
            BlockStep::Skip => {}
        }
    }

    if !pending.is_empty() {
        if saw_tool_block {
            // Observed protocol semantics: plain content trailing the last
            // tool block of a turn is not emitted.
            warn!(
                "message {}: dropping {} content part(s) trailing a tool block",
                index,
                pending.len()
            );
        } else {
            out.push(ChatMessage {
                role: role.to_string(),
                content: ChatMessageContent::Parts(pending),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            });
        }
    }

    Ok(())
}

fn flush_pending(role: &str, pending: &mut Vec<ContentPart>, out: &mut Vec<ChatMessage>) {
    if pending.is_empty() {
        return;
    }
    out.push(ChatMessage {
        role: role.to_string(),
        content: ChatMessageContent::Parts(std::mem::take(pending)),
        tool_calls: None,
        tool_call_id: None,
        name: None,
    });
}

fn classify_block(
    block: &MessagesContentBlock,
    index: usize,
) -> Result<BlockStep, TransformError> {
    match block {
        MessagesContentBlock::Text { text, .. } => Ok(BlockStep::Accumulate(ContentPart::Text {
            text: text.clone(),
        })),
        MessagesContentBlock::Image { source } => {
            match resolve_image_url(source.as_ref(), index) {
                Some(url) => Ok(BlockStep::Accumulate(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url,
                        detail: Some("auto".to_string()),
                    },
                })),
                None => Ok(BlockStep::Skip),
            }
        }
        MessagesContentBlock::ToolUse {
            id, name, input, ..
        } => {
            let id = id
                .as_deref()
                .ok_or(TransformError::MalformedToolUse { index, field: "id" })?;
            let name = name.as_deref().ok_or(TransformError::MalformedToolUse {
                index,
                field: "name",
            })?;
            let arguments = match input {
                Some(input) => serde_json::to_string(input)?,
                None => "{}".to_string(),
            };
            Ok(BlockStep::ToolCall(ToolCall {
                id: id.to_string(),
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments,
                },
            }))
        }
        MessagesContentBlock::ToolResult {
            tool_use_id,
            content,
            ..
        } => {
            let tool_call_id = tool_use_id
                .as_deref()
                .ok_or(TransformError::MalformedToolResult { index })?;
            Ok(BlockStep::ToolOutput {
                tool_call_id: tool_call_id.to_string(),
                content: resolve_tool_result_text(content.as_ref(), index),
            })
        }
        MessagesContentBlock::Unknown(value) => {
            warn!(
                "message {}: skipping unrecognized content block type {:?}",
                index,
                value.get("type").and_then(Value::as_str).unwrap_or("?")
            );
            Ok(BlockStep::Skip)
        }
    }
}

/// Resolve an image source to a URL the target protocol accepts, or `None`
/// when the block must be skipped. Skips are diagnostic-only.
fn resolve_image_url(source: Option<&MessagesImageSource>, index: usize) -> Option<String> {
    match source {
        Some(MessagesImageSource::Base64 { media_type, data }) => {
            if data.is_empty() {
                warn!("message {}: base64 image with empty data, skipping", index);
                return None;
            }
            let media_type = media_type.as_deref().unwrap_or(FALLBACK_MEDIA_TYPE);
            Some(format!("data:{};base64,{}", media_type, data))
        }
        Some(MessagesImageSource::Url { url }) => {
            if url.is_empty() {
                warn!("message {}: image with empty url, skipping", index);
                return None;
            }
            Some(url.clone())
        }
        Some(MessagesImageSource::Unknown(value)) => {
            warn!(
                "message {}: unknown image source type {:?}, skipping",
                index,
                value.get("type").and_then(Value::as_str).unwrap_or("?")
            );
            None
        }
        None => {
            warn!("message {}: image block without a source, skipping", index);
            None
        }
    }
}

/// Resolve a tool result's content to plain text: strings verbatim, item
/// sequences by concatenating their `text` fields (non-text items coerce to
/// their JSON representation), anything else coerces wholesale.
fn resolve_tool_result_text(content: Option<&Value>, index: usize) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item.get("text").and_then(Value::as_str) {
                Some(text) => text.to_string(),
                None => item.to_string(),
            })
            .collect(),
        Some(other) => {
            warn!(
                "message {}: coercing non-string tool result content ({})",
                index,
                json_kind(other)
            );
            other.to_string()
        }
        None => {
            warn!("message {}: tool result without content, using empty string", index);
            String::new()
        }
    }
}

/// Map tool definitions, dropping hosted built-ins that have no
/// function-call equivalent.
fn convert_tools(tools: &[MessagesTool]) -> Vec<Tool> {
    tools
        .iter()
        .filter_map(|tool| {
            if tool
                .tool_type
                .as_deref()
                .is_some_and(|t| t.starts_with(WEB_SEARCH_TOOL_PREFIX))
            {
                debug!("dropping built-in tool `{}`", tool.name);
                return None;
            }
            Some(Tool {
                tool_type: "function".to_string(),
                function: Function {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool
                        .input_schema
                        .clone()
                        .unwrap_or_else(|| Value::Object(Default::default())),
                },
            })
        })
        .collect()
}

fn convert_tool_choice(choice: &MessagesToolChoice) -> Option<ToolChoice> {
    match choice {
        // Compatibility fallback: bare strings pass through verbatim.
        MessagesToolChoice::Mode(mode) => Some(ToolChoice::Mode(mode.clone())),
        MessagesToolChoice::Spec(spec) => match spec.kind {
            MessagesToolChoiceKind::Auto => Some(ToolChoice::Mode("auto".to_string())),
            MessagesToolChoiceKind::Any => Some(ToolChoice::Mode("required".to_string())),
            MessagesToolChoiceKind::Tool => match &spec.name {
                Some(name) => Some(ToolChoice::Function {
                    choice_type: "function".to_string(),
                    function: FunctionChoice { name: name.clone() },
                }),
                None => {
                    warn!("tool_choice of type `tool` without a name, dropping");
                    None
                }
            },
        },
        MessagesToolChoice::Other(value) => {
            warn!("unrecognized tool_choice {:?}, dropping", value);
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
