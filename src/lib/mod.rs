pub mod body;
pub mod error;
pub mod invoke;
pub mod media;
pub mod models;
pub mod payload;
pub mod pipe;
pub mod valves;

pub use body::RequestBody;
pub use error::PipeError;
pub use invoke::NovaTextStream;
pub use models::ModelEntry;
pub use pipe::{Pipe, PipeOutput};
pub use valves::Valves;

use aws_config::Region;
use aws_credential_types::Credentials;

/// Builds a Bedrock runtime client from the valves, for Converse and
/// ConverseStream.
///
/// Returns `None` when any credential field is blank; callers treat a missing
/// client as "feature unavailable" rather than an error.
///
/// https://docs.rs/aws-sdk-bedrockruntime/latest/aws_sdk_bedrockruntime/
pub async fn new_runtime_client(valves: &Valves) -> Option<aws_sdk_bedrockruntime::Client> {
    let config = sdk_config(valves).await?;
    Some(aws_sdk_bedrockruntime::Client::new(&config))
}

/// Builds a Bedrock control-plane client from the valves, for
/// ListFoundationModels.
///
/// https://docs.rs/aws-sdk-bedrock/latest/aws_sdk_bedrock/
pub async fn new_controlplane_client(valves: &Valves) -> Option<aws_sdk_bedrock::Client> {
    let config = sdk_config(valves).await?;
    Some(aws_sdk_bedrock::Client::new(&config))
}

// Wire up SdkConfig from the three valves fields.
//
// The host hands the pipe explicit static credentials, so they go straight
// into the provider instead of the usual profile/env-var chain:
// https://docs.rs/aws-config/latest/aws_config/
// https://docs.aws.amazon.com/sdk-for-rust/latest/dg/credproviders.html
async fn sdk_config(valves: &Valves) -> Option<aws_config::SdkConfig> {
    if !valves.is_configured() {
        return None;
    }
    let config = aws_config::from_env()
        .credentials_provider(Credentials::new(
            valves.aws_access_key.clone(),
            valves.aws_secret_key.clone(),
            None,
            None,
            "valves",
        ))
        .region(Region::new(valves.aws_region_name.clone()))
        .load()
        .await;
    Some(config)
}
