//! Host-side request schema.
//!
//! The rust structs here are set up so that serde accepts the chat body the
//! host posts to the pipe: either plain string content or the OpenAI-style
//! typed part list.
//!
//! https://serde.rs/enum-representations.html
//! https://serde.rs/field-attrs.html

use serde::{Deserialize, Serialize};

/// The body the host hands to `Pipe::pipe`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestBody {
    pub model: String,

    pub messages: Vec<ChatMessage>,

    #[serde(default)]
    pub stream: bool,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub top_p: Option<f64>,

    #[serde(default)]
    pub top_k: Option<i64>,

    #[serde(default)]
    pub max_tokens: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Flattens the content to plain text, joining text parts and dropping
    /// media parts.  Used for the system prompt, which Bedrock only accepts
    /// as text.
    pub fn joined_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },

    /// Hosts emit both `image_url` (OpenAI style) and the shorter `image`.
    #[serde(alias = "image")]
    ImageUrl { image_url: ImageRef },

    Document {
        url: String,
        #[serde(default)]
        content: String,
    },
}

/// An image reference: either a `data:image/...;base64,...` URI or an
/// external HTTP(S) URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

/// Removes the first system-role message from the list and returns its text,
/// if any.  Bedrock takes the system prompt as a separate top-level field, so
/// it must not remain in the message list.
pub fn take_system_message(messages: &mut Vec<ChatMessage>) -> Option<String> {
    let index = messages.iter().position(|m| m.role == "system")?;
    let message = messages.remove(index);
    Some(message.content.joined_text())
}
