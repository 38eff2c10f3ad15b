//! The pipe itself: the object the host loads and drives.
//!
//! Host contract:
//! - `pipes()` populates the model picker,
//! - `pipe(body)` answers a chat request with text or a text stream,
//! - `on_startup` / `on_shutdown` / `on_valves_updated` are lifecycle hooks.

use log::{error, info, warn};

use crate::body::{take_system_message, RequestBody};
use crate::error::PipeError;
use crate::invoke::{self, NovaTextStream};
use crate::models::{self, ModelEntry};
use crate::payload::{self, GenerationOptions};
use crate::valves::Valves;

pub struct Pipe {
    valves: Valves,
}

/// What a chat request produces: the whole reply, or a stream of fragments.
pub enum PipeOutput {
    Text(String),
    Stream(NovaTextStream),
}

impl Pipe {
    /// Creates the pipe with valves populated from the environment.
    pub fn new() -> Self {
        Self { valves: Valves::from_env() }
    }

    pub fn with_valves(valves: Valves) -> Self {
        Self { valves }
    }

    pub fn valves(&self) -> &Valves {
        &self.valves
    }

    pub async fn on_startup(&self) {
        info!("bedrock nova pipe starting");
        if !self.valves.is_configured() {
            warn!("AWS credentials are not configured; models will be unavailable");
        }
    }

    pub async fn on_shutdown(&self) {
        info!("bedrock nova pipe shutting down");
    }

    /// Replaces the valves.  In-flight requests keep the snapshot they took
    /// at dispatch time.
    pub async fn on_valves_updated(&mut self, valves: Valves) {
        info!("valves updated (region: {})", valves.aws_region_name);
        self.valves = valves;
    }

    /// Model discovery for the host's picker.
    ///
    /// Failures are reported in-band as a single `id == "error"` entry so the
    /// host can render guidance in place of a model choice.
    pub async fn pipes(&self) -> Vec<ModelEntry> {
        let Some(client) = crate::new_controlplane_client(&self.valves).await else {
            return vec![ModelEntry::error(
                "AWS credentials missing: set AWS_ACCESS_KEY, AWS_SECRET_KEY and \
                 AWS_REGION_NAME in the pipe valves",
            )];
        };
        match models::list_nova_models(&client).await {
            Ok(entries) => entries,
            Err(err) => {
                error!("model listing failed: {err}");
                vec![ModelEntry::error(format!("{err}"))]
            }
        }
    }

    /// Answers a chat request, mapping any failure to text beginning with
    /// `"Error: "` — the host treats whatever comes back as model output.
    pub async fn pipe(&self, body: RequestBody) -> PipeOutput {
        match self.try_pipe(body).await {
            Ok(output) => output,
            Err(err) => {
                error!("pipe request failed: {err}");
                PipeOutput::Text(format!("Error: {err}"))
            }
        }
    }

    /// The typed variant of [`Pipe::pipe`], for hosts that can tell failures
    /// apart from content.
    pub async fn try_pipe(&self, body: RequestBody) -> Result<PipeOutput, PipeError> {
        // Snapshot the valves for the whole request; a concurrent
        // on_valves_updated must not be observed halfway through.
        let valves = self.valves.clone();
        let client = crate::new_runtime_client(&valves)
            .await
            .ok_or(PipeError::NotConfigured)?;

        let options = GenerationOptions::from(&body);
        let model_id = normalize_model_id(&body.model).to_string();
        let mut messages = body.messages;
        let system = take_system_message(&mut messages);

        let payload = payload::build_payload(model_id, system, &messages, options).await?;

        if body.stream {
            let stream = invoke::converse_stream(&client, payload).await?;
            Ok(PipeOutput::Stream(stream))
        } else {
            let text = invoke::converse(&client, payload).await?;
            Ok(PipeOutput::Text(text))
        }
    }
}

impl Default for Pipe {
    fn default() -> Self {
        Self::new()
    }
}

/// Discards the host's pipe prefix from the incoming model id: everything
/// through the first `.` goes, e.g. `"amazon.nova-lite-v1"` becomes
/// `"nova-lite-v1"`.
pub fn normalize_model_id(model: &str) -> &str {
    match model.split_once('.') {
        Some((_, rest)) => rest,
        None => model,
    }
}
