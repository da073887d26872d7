//! DynamoDB client construction.
//!
//! Supports multiple credential sources:
//! - Hardcoded credentials
//! - AWS profiles
//! - The default chain (environment variables, instance profile, etc.)

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{Credentials, Region};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Region used when neither the settings nor the environment name one.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Connection settings for the DynamoDB client.
///
/// Credentials priority:
/// 1. Hardcoded credentials (`access_key`, `secret_key`, `session_token`)
/// 2. AWS profile from ~/.aws/credentials
/// 3. Default credential chain
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    pub region: Option<String>,
    /// Custom endpoint, e.g. DynamoDB Local or localstack.
    pub endpoint_url: Option<String>,
    pub profile: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: Some(DEFAULT_REGION.to_string()),
            endpoint_url: None,
            profile: None,
            access_key: None,
            secret_key: None,
            session_token: None,
        }
    }
}

impl fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AwsSettings")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("profile", &self.profile)
            .field("access_key", &self.access_key)
            .field("secret_key", &redact(&self.secret_key))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

/// Build the AWS SDK DynamoDB client from `settings`.
///
/// Region priority: settings > default provider chain > [`DEFAULT_REGION`].
pub async fn build_client(settings: &AwsSettings) -> Client {
    let region_provider = RegionProviderChain::first_try(settings.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(DEFAULT_REGION);

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

    if let (Some(ak), Some(sk)) = (&settings.access_key, &settings.secret_key) {
        debug!("using hardcoded credentials");
        let creds = Credentials::new(
            ak.clone(),
            sk.clone(),
            settings.session_token.clone(),
            None,
            "dynostore-hardcoded",
        );
        config_loader = config_loader.credentials_provider(creds);
    } else if let Some(profile_name) = &settings.profile {
        debug!(profile = %profile_name, "using profile credentials");
        let profile_provider = ProfileFileCredentialsProvider::builder()
            .profile_name(profile_name)
            .build();
        config_loader = config_loader.credentials_provider(profile_provider);
    }
    // else: default credential chain

    let sdk_config = config_loader.load().await;

    let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
    if let Some(url) = &settings.endpoint_url {
        debug!(endpoint = %url, "using custom endpoint");
        dynamo_config = dynamo_config.endpoint_url(url);
    }

    Client::from_conf(dynamo_config.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let settings = AwsSettings {
            access_key: Some("AKIAEXAMPLE".into()),
            secret_key: Some("very-secret".into()),
            ..Default::default()
        };
        let printed = format!("{:?}", settings);
        assert!(printed.contains("AKIAEXAMPLE"));
        assert!(!printed.contains("very-secret"));
    }

    #[tokio::test]
    async fn builds_client_for_local_endpoint() {
        let settings = AwsSettings {
            region: Some("eu-west-1".into()),
            endpoint_url: Some("http://localhost:8000".into()),
            access_key: Some("local".into()),
            secret_key: Some("local".into()),
            ..Default::default()
        };
        let client = build_client(&settings).await;
        assert_eq!(
            client.config().region().map(|r| r.as_ref()),
            Some("eu-west-1")
        );
    }
}
