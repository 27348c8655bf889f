//! Chat-Completions-protocol stream chunks → Messages-protocol stream events.
//!
//! One chunk maps to at most one event; lifecycle events the source protocol
//! has no equivalent for (`message_start` on role-only chunks, keepalives)
//! degrade to `ping`, which the embedding proxy may drop or forward.

use serde_json::Value;

use crate::apis::chat_completions::{ChatCompletionsStreamResponse, ToolCallDelta};
use crate::apis::messages::{
    MessagesContentBlock, MessagesContentDelta, MessagesMessageDelta, MessagesStreamEvent,
    MessagesUsage,
};
use crate::error::TransformError;

impl TryFrom<ChatCompletionsStreamResponse> for MessagesStreamEvent {
    type Error = TransformError;

    fn try_from(chunk: ChatCompletionsStreamResponse) -> Result<Self, Self::Error> {
        let Some(choice) = chunk.choices.first() else {
            return Ok(MessagesStreamEvent::Ping);
        };

        // Final chunk: finish reason plus usage totals.
        if let (Some(usage), Some(finish_reason)) = (&chunk.usage, &choice.finish_reason) {
            return Ok(MessagesStreamEvent::MessageDelta {
                delta: MessagesMessageDelta {
                    stop_reason: (*finish_reason).into(),
                    stop_sequence: None,
                },
                usage: MessagesUsage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                },
            });
        }

        if let Some(content) = &choice.delta.content {
            if !content.is_empty() {
                return Ok(MessagesStreamEvent::ContentBlockDelta {
                    index: 0,
                    delta: MessagesContentDelta::TextDelta {
                        text: content.clone(),
                    },
                });
            }
        }

        if let Some(tool_calls) = &choice.delta.tool_calls {
            return Ok(convert_tool_call_delta(tool_calls));
        }

        // Finish without usage: emit the stop reason with zeroed counts.
        if let Some(finish_reason) = &choice.finish_reason {
            return Ok(MessagesStreamEvent::MessageDelta {
                delta: MessagesMessageDelta {
                    stop_reason: (*finish_reason).into(),
                    stop_sequence: None,
                },
                usage: MessagesUsage {
                    input_tokens: 0,
                    output_tokens: 0,
                },
            });
        }

        Ok(MessagesStreamEvent::Ping)
    }
}

/// A delta naming the call (id + function name) opens a tool-use block;
/// subsequent argument fragments stream as input-json deltas.
fn convert_tool_call_delta(deltas: &[ToolCallDelta]) -> MessagesStreamEvent {
    let Some(delta) = deltas.first() else {
        return MessagesStreamEvent::Ping;
    };

    let name = delta.function.as_ref().and_then(|f| f.name.clone());
    if let (Some(id), Some(name)) = (delta.id.clone(), name) {
        return MessagesStreamEvent::ContentBlockStart {
            index: delta.index,
            content_block: MessagesContentBlock::ToolUse {
                id: Some(id),
                name: Some(name),
                input: Some(Value::Object(Default::default())),
                cache_control: None,
            },
        };
    }

    if let Some(arguments) = delta.function.as_ref().and_then(|f| f.arguments.clone()) {
        return MessagesStreamEvent::ContentBlockDelta {
            index: delta.index,
            delta: MessagesContentDelta::InputJsonDelta {
                partial_json: arguments,
            },
        };
    }

    MessagesStreamEvent::Ping
}

impl MessagesStreamEvent {
    /// Render this event as a server-sent-events frame.
    pub fn to_sse_frame(&self) -> String {
        let data = serde_json::to_string(self).unwrap_or_default();
        format!("event: {}\ndata: {}\n\n", self.event_type(), data)
    }
}
