//! The request body for the completion endpoint.

use crate::Message;
use compact_str::CompactString;
use serde::Serialize;

/// A chat-completion request body.
///
/// Generation parameters are passed through from configuration; this
/// crate does not tune them.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// The model we are using
    pub model: CompactString,

    /// The ordered messages to send to the API
    pub messages: Vec<Message>,

    /// The temperature to use for the response
    pub temperature: f32,

    /// The maximum number of tokens to generate
    pub max_tokens: usize,
}

impl Request {
    /// Create a new request with an empty message list.
    pub fn new(model: impl Into<CompactString>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature,
            max_tokens,
        }
    }

    /// Replace the message list for the request.
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }
}
