//! Nova model discovery for the host's model picker.
//!
//! https://docs.aws.amazon.com/bedrock/latest/APIReference/API_ListFoundationModels.html

use aws_sdk_bedrock::types::{FoundationModelSummary, InferenceType};
use log::debug;
use serde::Serialize;

use crate::error::{sdk_error_message, PipeError};

/// Case-insensitive substring that picks the Nova family out of Amazon's
/// foundation models.
pub const NOVA_FAMILY: &str = "nova";

/// One entry in the host's model picker.
///
/// By convention a failure is reported in-band as a single entry with
/// `id == "error"` and guidance in `name`, so the host renders something
/// actionable instead of an empty picker.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
}

impl ModelEntry {
    pub fn error(name: impl Into<String>) -> Self {
        Self { id: "error".to_string(), name: name.into() }
    }
}

/// Lists on-demand Amazon foundation models and keeps the Nova family.
pub async fn list_nova_models(
    client: &aws_sdk_bedrock::Client,
) -> Result<Vec<ModelEntry>, PipeError> {
    let output = client
        .list_foundation_models()
        .by_provider("Amazon")
        .by_inference_type(InferenceType::OnDemand)
        .send()
        .await
        .map_err(|err| PipeError::ModelList(sdk_error_message(&err)))?;

    let entries = nova_entries(output.model_summaries());
    debug!("found {} nova models", entries.len());
    Ok(entries)
}

/// Maps summaries whose model id contains [`NOVA_FAMILY`] to picker entries.
pub fn nova_entries(summaries: &[FoundationModelSummary]) -> Vec<ModelEntry> {
    summaries
        .iter()
        .filter(|summary| summary.model_id().to_lowercase().contains(NOVA_FAMILY))
        .map(|summary| ModelEntry {
            id: summary.model_id().to_string(),
            name: summary
                .model_name()
                .unwrap_or_else(|| summary.model_id())
                .to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(model_id: &str, model_name: Option<&str>) -> FoundationModelSummary {
        let mut builder = FoundationModelSummary::builder()
            .model_arn(format!("arn:aws:bedrock:us-east-1::foundation-model/{model_id}"))
            .model_id(model_id);
        if let Some(name) = model_name {
            builder = builder.model_name(name);
        }
        builder.build().unwrap()
    }

    #[test]
    fn keeps_only_nova_models() {
        let summaries = vec![
            summary("amazon.titan-text-express-v1", Some("Titan Text Express")),
            summary("amazon.nova-lite-v1:0", Some("Nova Lite")),
            summary("amazon.NOVA-pro-v1:0", Some("Nova Pro")),
            summary("amazon.rerank-v1:0", Some("Rerank")),
        ];

        let entries = nova_entries(&summaries);
        assert_eq!(
            vec![
                ModelEntry { id: "amazon.nova-lite-v1:0".to_string(), name: "Nova Lite".to_string() },
                ModelEntry { id: "amazon.NOVA-pro-v1:0".to_string(), name: "Nova Pro".to_string() },
            ],
            entries
        );
    }

    #[test]
    fn name_falls_back_to_model_id() {
        let entries = nova_entries(&[summary("amazon.nova-micro-v1:0", None)]);
        assert_eq!("amazon.nova-micro-v1:0", entries[0].name);
    }

    #[test]
    fn no_matches_yields_empty_list() {
        let entries = nova_entries(&[summary("amazon.titan-embed-text-v1", Some("Titan Embed"))]);
        assert!(entries.is_empty());
    }

    #[test]
    fn error_entry_uses_sentinel_id() {
        let entry = ModelEntry::error("something broke");
        assert_eq!("error", entry.id);
        assert_eq!("something broke", entry.name);
    }
}
