//! Chat response abstractions for the unified completion interface.

use crate::Role;
use serde::{Deserialize, Serialize};

/// A chat completion response from the model provider.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Response {
    /// A unique identifier for the chat completion
    #[serde(default)]
    pub id: String,

    /// Unix timestamp (in seconds) of when the response was created
    #[serde(default)]
    pub created: u64,

    /// The model used for the completion
    #[serde(default)]
    pub model: String,

    /// The list of completion choices
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage statistics
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl Response {
    /// Get the text of the first choice.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }

    /// Get the reason the model stopped generating.
    pub fn reason(&self) -> Option<FinishReason> {
        self.choices.first().and_then(|choice| choice.finish_reason)
    }
}

/// A completion choice in a response.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Choice {
    /// The index of this choice in the list
    #[serde(default)]
    pub index: u32,

    /// The generated message
    #[serde(default)]
    pub message: ResponseMessage,

    /// The reason the model stopped generating
    pub finish_reason: Option<FinishReason>,
}

/// Message content in a completion response.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResponseMessage {
    /// The role of the message author
    pub role: Option<Role>,

    /// The content of the message
    pub content: Option<String>,
}

/// The reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model finished naturally
    #[default]
    Stop,

    /// The model hit the max token limit
    Length,

    /// Content was filtered by the provider
    ContentFilter,
}

impl FinishReason {
    /// Wire name of the finish reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
        }
    }
}

impl std::str::FromStr for FinishReason {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stop" => Ok(FinishReason::Stop),
            "length" => Ok(FinishReason::Length),
            "content_filter" => Ok(FinishReason::ContentFilter),
            other => anyhow::bail!("unknown finish reason: {other}"),
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct Usage {
    /// Tokens consumed by the prompt
    #[serde(default)]
    pub prompt_tokens: u64,

    /// Tokens produced by the completion
    #[serde(default)]
    pub completion_tokens: u64,

    /// Total tokens billed
    #[serde(default)]
    pub total_tokens: u64,
}
