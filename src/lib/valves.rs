//! Pipe configuration ("valves" in host terms).
//!
//! The host materializes this struct from its admin UI and re-creates it on
//! every update, so fields default from the environment on first load:
//!
//! - `AWS_ACCESS_KEY`
//! - `AWS_SECRET_KEY`
//! - `AWS_REGION_NAME`

use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Valves {
    #[serde(default = "default_access_key")]
    pub aws_access_key: String,

    #[serde(default = "default_secret_key")]
    pub aws_secret_key: String,

    #[serde(default = "default_region")]
    pub aws_region_name: String,
}

impl Valves {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            aws_access_key: access_key.into(),
            aws_secret_key: secret_key.into(),
            aws_region_name: region.into(),
        }
    }

    /// Reads all three fields from the environment, leaving any missing
    /// variable as an empty string.
    pub fn from_env() -> Self {
        Self {
            aws_access_key: default_access_key(),
            aws_secret_key: default_secret_key(),
            aws_region_name: default_region(),
        }
    }

    /// All three fields present.  A partially filled configuration is treated
    /// the same as an empty one.
    pub fn is_configured(&self) -> bool {
        !self.aws_access_key.is_empty()
            && !self.aws_secret_key.is_empty()
            && !self.aws_region_name.is_empty()
    }
}

impl Default for Valves {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_access_key() -> String {
    env::var("AWS_ACCESS_KEY").unwrap_or_default()
}

fn default_secret_key() -> String {
    env::var("AWS_SECRET_KEY").unwrap_or_default()
}

fn default_region() -> String {
    env::var("AWS_REGION_NAME").unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_only_when_all_fields_present() {
        assert!(Valves::new("key", "secret", "us-east-1").is_configured());
        assert!(!Valves::new("", "secret", "us-east-1").is_configured());
        assert!(!Valves::new("key", "", "us-east-1").is_configured());
        assert!(!Valves::new("key", "secret", "").is_configured());
    }

    #[test]
    fn deserializes_with_explicit_fields() {
        let valves: Valves = serde_json::from_str(
            r#"{"aws_access_key":"k","aws_secret_key":"s","aws_region_name":"eu-west-1"}"#,
        )
        .unwrap();
        assert_eq!("eu-west-1", valves.aws_region_name);
        assert!(valves.is_configured());
    }
}
