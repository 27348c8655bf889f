//! Protocol transformations.
//!
//! The crate translates between two API formats:
//! - `/v1/messages` (Messages protocol)
//! - `/v1/chat/completions` (Chat Completions protocol)
//!
//! The request direction is a free function (`transform_request`) because it
//! takes a target model and streaming intent alongside the source body; the
//! response and streaming directions are `TryFrom` conversions on the shape
//! types themselves.

pub mod request;
pub mod response;
pub mod streaming;

pub use request::{
    transform_count_tokens_request, transform_messages_request, transform_request,
    WEB_SEARCH_TOOL_PREFIX,
};
