use serde::{Deserialize, Serialize};

use crate::chat::ImageAttachment;

/// Represents the role of a message sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// Represents a message in the rendered conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(skip, default)]
    pub attachments: Vec<ImageAttachment>,
    /// True while the message is still being streamed token by token.
    #[serde(skip, default)]
    pub pending: bool,
}

impl UiMessage {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            role,
            content,
            attachments: Vec::new(),
            pending: false,
        }
    }

    /// Create a new user message
    pub fn user(content: String) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a completed assistant message, keeping any attachments
    pub fn assistant(content: String, attachments: Vec<ImageAttachment>) -> Self {
        let mut msg = Self::new(MessageRole::Assistant, content);
        msg.attachments = attachments;
        msg
    }

    /// Create an empty assistant placeholder to be filled incrementally
    pub fn streaming() -> Self {
        let mut msg = Self::new(MessageRole::Assistant, String::new());
        msg.pending = true;
        msg
    }
}
