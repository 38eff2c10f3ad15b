//! Builds the Converse request payload from host messages.
//!
//! See:
//! https://docs.aws.amazon.com/bedrock/latest/userguide/conversation-inference-call.html
//! https://docs.aws.amazon.com/nova/latest/userguide/using-converse-api.html

use std::collections::HashMap;

use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use aws_smithy_types::Document;

use crate::body::{ChatMessage, ContentPart, MessageContent, RequestBody};
use crate::error::PipeError;
use crate::media;

/// Used when the host supplies no system-role message.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Everything the Converse and ConverseStream operations need, minus the
/// client.  Built fresh per request and discarded after the call.
#[derive(Debug, Clone)]
pub struct ConversePayload {
    pub model_id: String,
    pub messages: Vec<Message>,
    pub system: Option<Vec<SystemContentBlock>>,
    pub inference_config: Option<InferenceConfiguration>,
    pub additional_model_request_fields: Option<Document>,
}

/// Generation options lifted off the request body.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<i64>,
    pub max_tokens: Option<i32>,
}

impl From<&RequestBody> for GenerationOptions {
    fn from(body: &RequestBody) -> Self {
        Self {
            temperature: body.temperature,
            top_p: body.top_p,
            top_k: body.top_k,
            max_tokens: body.max_tokens,
        }
    }
}

/// Maps the host messages, system prompt and options into a Converse payload.
///
/// Async because image parts may need to be fetched.
pub async fn build_payload(
    model_id: impl Into<String>,
    system: Option<String>,
    messages: &[ChatMessage],
    options: GenerationOptions,
) -> Result<ConversePayload, PipeError> {
    let mut converted = Vec::with_capacity(messages.len());
    for message in messages {
        converted.push(convert_message(message).await?);
    }

    let system_text = system.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
    let system = if system_text.is_empty() {
        None
    } else {
        Some(vec![SystemContentBlock::Text(system_text)])
    };

    Ok(ConversePayload {
        model_id: model_id.into(),
        messages: converted,
        system,
        inference_config: inference_config(options),
        additional_model_request_fields: additional_fields(options),
    })
}

async fn convert_message(message: &ChatMessage) -> Result<Message, PipeError> {
    let role = match message.role.as_str() {
        "assistant" => ConversationRole::Assistant,
        _ => ConversationRole::User,
    };
    let mut builder = Message::builder().role(role);

    match &message.content {
        MessageContent::Text(text) => {
            builder = builder.content(ContentBlock::Text(text.clone()));
        }
        MessageContent::Parts(parts) => {
            for part in parts {
                let block = match part {
                    ContentPart::Text { text } => ContentBlock::Text(text.clone()),
                    ContentPart::ImageUrl { image_url } => {
                        ContentBlock::Image(media::image_block(image_url).await?)
                    }
                    ContentPart::Document { url, content } => {
                        ContentBlock::Document(media::document_block(url, content)?)
                    }
                };
                builder = builder.content(block);
            }
        }
    }

    Ok(builder.build()?)
}

// temperature and topP live in the typed inference config; absent options
// stay absent so the model's own defaults apply.
fn inference_config(options: GenerationOptions) -> Option<InferenceConfiguration> {
    if options.temperature.is_none() && options.top_p.is_none() && options.max_tokens.is_none() {
        return None;
    }
    let mut builder = InferenceConfiguration::builder();
    if let Some(temperature) = options.temperature {
        builder = builder.temperature(temperature as f32);
    }
    if let Some(top_p) = options.top_p {
        builder = builder.top_p(top_p as f32);
    }
    if let Some(max_tokens) = options.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }
    Some(builder.build())
}

// topK is not part of the unified inference config; Nova takes it through
// additionalModelRequestFields, nested under its own inferenceConfig key:
// https://docs.aws.amazon.com/nova/latest/userguide/complete-request-schema.html
fn additional_fields(options: GenerationOptions) -> Option<Document> {
    let top_k = options.top_k?;
    let inner = Document::Object(HashMap::from([(
        "topK".to_string(),
        Document::from(top_k),
    )]));
    Some(Document::Object(HashMap::from([(
        "inferenceConfig".to_string(),
        inner,
    )])))
}
