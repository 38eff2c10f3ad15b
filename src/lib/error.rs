//! Error type for the pipe.
//!
//! The host contract expects a plain string beginning with "Error: " in place
//! of model output, so every variant here carries a message a user can act
//! on.  `Pipe::try_pipe` exposes the typed channel; `Pipe::pipe` renders it.

use aws_sdk_bedrockruntime::error::{BuildError, ProvideErrorMetadata, SdkError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipeError {
    #[error(
        "AWS credentials are not configured; set AWS_ACCESS_KEY, AWS_SECRET_KEY \
         and AWS_REGION_NAME in the pipe valves"
    )]
    NotConfigured,

    #[error("invalid message content: {0}")]
    InvalidContent(String),

    #[error("could not decode base64 media data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("could not fetch image from {url}: {source}")]
    ImageFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build Bedrock request: {0}")]
    Build(#[from] BuildError),

    #[error("could not list Bedrock models: {0}")]
    ModelList(String),

    #[error("Bedrock converse failed: {0}")]
    Converse(String),

    #[error("Bedrock converse stream failed: {0}")]
    Stream(String),

    #[error("model response contained no text content")]
    EmptyResponse,
}

/// Summarizes an SDK error into the service error code and message when one
/// is present, falling back to the transport-level debug rendering.
pub(crate) fn sdk_error_message<E, R>(error: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    match error {
        SdkError::ServiceError(service) => {
            let err = service.err();
            let message = err.message().unwrap_or("unknown error");
            match err.code() {
                Some(code) => format!("{code}: {message}"),
                None => message.to_string(),
            }
        }
        other => format!("{other:?}"),
    }
}
