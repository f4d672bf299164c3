//! Wire-shaped types for both API styles the CLI speaks.
//!
//! OpenAI-style payloads travel through `chat.completions`, Anthropic-style
//! payloads through `messages`; sessions accept either via [`PromptMessage`].

pub mod anthropic;
pub mod openai;

pub use anthropic::{
    AnthropicContent, AnthropicMessage, AnthropicMessageParams, AnthropicMessageResponse,
    AnthropicStreamEvent, AnthropicTool, AnthropicUsage, ContentBlock, ImageSource, StreamDelta,
};
pub use openai::{
    OpenAiChatCompletion, OpenAiChatCompletionChunk, OpenAiCompletionChoice, OpenAiCompletionParams,
    OpenAiFunction, OpenAiMessage, OpenAiResponseMessage, OpenAiStreamChoice, OpenAiStreamDelta,
    OpenAiTool, OpenAiUsage,
};

use serde::{Deserialize, Serialize};

/// Participant role shared by both API styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Workspace file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A message in either API style, as accepted by session calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptMessage {
    OpenAi(OpenAiMessage),
    Anthropic(AnthropicMessage),
}

impl PromptMessage {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::OpenAi(message) => message.role,
            Self::Anthropic(message) => message.role,
        }
    }

    /// Flattens the content to plain text, joining block content with
    /// newlines.
    #[must_use]
    pub fn flatten_text(&self) -> String {
        match self {
            Self::OpenAi(message) => message.content.clone(),
            Self::Anthropic(message) => message.content.flatten_text(),
        }
    }
}

impl From<OpenAiMessage> for PromptMessage {
    fn from(message: OpenAiMessage) -> Self {
        Self::OpenAi(message)
    }
}

impl From<AnthropicMessage> for PromptMessage {
    fn from(message: AnthropicMessage) -> Self {
        Self::Anthropic(message)
    }
}
