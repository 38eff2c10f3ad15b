//! Synchronous and streaming Converse invocation.
//!
//! See:
//! https://docs.rs/aws-sdk-bedrockruntime/latest/aws_sdk_bedrockruntime/operation/converse/builders/struct.ConverseFluentBuilder.html
//! https://docs.rs/aws-sdk-bedrockruntime/latest/aws_sdk_bedrockruntime/operation/converse_stream/builders/struct.ConverseStreamFluentBuilder.html

use aws_sdk_bedrockruntime::primitives::event_stream::EventReceiver;
use aws_sdk_bedrockruntime::operation::converse::ConverseOutput as ConverseResponse;
use aws_sdk_bedrockruntime::types::error::ConverseStreamOutputError;
use aws_sdk_bedrockruntime::types::{ContentBlock, ContentBlockDelta, ConverseStreamOutput};
use aws_sdk_bedrockruntime::Client;
use futures::stream::{self, Stream};
use log::debug;

use crate::error::{sdk_error_message, PipeError};
use crate::payload::ConversePayload;

/// Sends the payload and returns the first text content block of the output
/// message.
pub async fn converse(client: &Client, payload: ConversePayload) -> Result<String, PipeError> {
    debug!("converse model-id: {}", payload.model_id);
    let response = client
        .converse()
        .model_id(payload.model_id)
        .set_messages(Some(payload.messages))
        .set_system(payload.system)
        .set_inference_config(payload.inference_config)
        .set_additional_model_request_fields(payload.additional_model_request_fields)
        .send()
        .await
        .map_err(|err| PipeError::Converse(sdk_error_message(&err)))?;
    first_text(response)
}

fn first_text(response: ConverseResponse) -> Result<String, PipeError> {
    let message = response
        .output()
        .and_then(|output| output.as_message().ok())
        .ok_or(PipeError::EmptyResponse)?;
    for block in message.content() {
        if let ContentBlock::Text(text) = block {
            return Ok(text.clone());
        }
    }
    Err(PipeError::EmptyResponse)
}

/// Opens a Converse stream and wraps it in a [`NovaTextStream`].
pub async fn converse_stream(
    client: &Client,
    mut payload: ConversePayload,
) -> Result<NovaTextStream, PipeError> {
    debug!("converse-stream model-id: {}", payload.model_id);

    // ConverseStream rejects additionalModelRequestFields, so topK is
    // dropped for streaming requests.
    payload.additional_model_request_fields = None;

    let response = client
        .converse_stream()
        .model_id(payload.model_id)
        .set_messages(Some(payload.messages))
        .set_system(payload.system)
        .set_inference_config(payload.inference_config)
        .send()
        .await
        .map_err(|err| PipeError::Stream(sdk_error_message(&err)))?;

    Ok(NovaTextStream { events: response.stream })
}

/// A lazy, finite, non-restartable sequence of text fragments.
///
/// Each pull blocks on the next stream event; events that carry no
/// `contentBlockDelta` text are skipped.  Dropping the value closes the
/// underlying event stream, so early termination just stops pulling.
pub struct NovaTextStream {
    events: EventReceiver<ConverseStreamOutput, ConverseStreamOutputError>,
}

impl NovaTextStream {
    /// Pulls the next text fragment, or `None` once the stream is exhausted.
    pub async fn next(&mut self) -> Option<Result<String, PipeError>> {
        loop {
            match self.events.recv().await {
                Ok(Some(event)) => {
                    if let Some(text) = delta_text(&event) {
                        return Some(Ok(text.to_string()));
                    }
                }
                Ok(None) => return None,
                Err(err) => return Some(Err(PipeError::Stream(format!("{err:?}")))),
            }
        }
    }

    /// Adapts the receiver into a `futures::Stream` for hosts that consume
    /// one.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, PipeError>> {
        stream::unfold(self, |mut events| async move {
            let item = events.next().await?;
            Some((item, events))
        })
    }
}

/// The text carried by a `contentBlockDelta` event, if that is what this is.
pub(crate) fn delta_text(event: &ConverseStreamOutput) -> Option<&str> {
    match event {
        ConverseStreamOutput::ContentBlockDelta(delta) => match delta.delta() {
            Some(ContentBlockDelta::Text(text)) => Some(text.as_str()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_bedrockruntime::types::{
        ContentBlockDeltaEvent, ContentBlockStartEvent, ConversationRole, MessageStartEvent,
        ToolUseBlockDelta,
    };

    fn text_delta(text: &str) -> ConverseStreamOutput {
        ConverseStreamOutput::ContentBlockDelta(
            ContentBlockDeltaEvent::builder()
                .delta(ContentBlockDelta::Text(text.to_string()))
                .content_block_index(0)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn only_text_delta_events_yield_chunks() {
        let events = vec![
            ConverseStreamOutput::MessageStart(
                MessageStartEvent::builder()
                    .role(ConversationRole::Assistant)
                    .build()
                    .unwrap(),
            ),
            text_delta("Hel"),
            ConverseStreamOutput::ContentBlockStart(
                ContentBlockStartEvent::builder()
                    .content_block_index(1)
                    .build()
                    .unwrap(),
            ),
            text_delta("lo"),
        ];

        let chunks: Vec<&str> = events.iter().filter_map(delta_text).collect();
        assert_eq!(vec!["Hel", "lo"], chunks);
    }

    #[test]
    fn non_text_delta_is_skipped() {
        let event = ConverseStreamOutput::ContentBlockDelta(
            ContentBlockDeltaEvent::builder()
                .delta(ContentBlockDelta::ToolUse(
                    ToolUseBlockDelta::builder().input("{}").build().unwrap(),
                ))
                .content_block_index(0)
                .build()
                .unwrap(),
        );
        assert_eq!(None, delta_text(&event));
    }
}
