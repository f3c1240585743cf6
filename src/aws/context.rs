//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once and
//! creating multiple service clients from the same config.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// Shared AWS configuration context for creating service clients.
///
/// # Example
/// ```ignore
/// let aws = AwsContext::new("us-west-2").await;
///
/// let s3 = S3Client::from_context(&aws);
/// let secrets = SecretsClient::from_context(&aws);
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration for the specified region.
    ///
    /// Credentials come from the usual chain: environment, config files,
    /// or the Lambda execution role.
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    /// This context if it is already bound to `region`, else a new one.
    ///
    /// Loading resolves the whole provider chain, so warm callers should keep
    /// one context and only reload for a different region.
    pub async fn for_region(&self, region: &str) -> Self {
        if region == self.region {
            self.clone()
        } else {
            Self::new(region).await
        }
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Create an S3 client from this context.
    pub fn s3_client(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(self.sdk_config())
    }

    /// Create a Secrets Manager client from this context.
    pub fn secrets_client(&self) -> aws_sdk_secretsmanager::Client {
        aws_sdk_secretsmanager::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preloaded(region: &str) -> AwsContext {
        let config = SdkConfig::builder()
            .region(Region::new(region.to_string()))
            .behavior_version(BehaviorVersion::latest())
            .build();
        AwsContext {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    #[tokio::test]
    async fn same_region_reuses_loaded_config() {
        let ctx = preloaded("us-east-1");
        let reused = ctx.for_region("us-east-1").await;
        assert!(Arc::ptr_eq(&ctx.config, &reused.config));
        assert_eq!(reused.region(), "us-east-1");
    }

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn other_region_loads_fresh_config() {
        let ctx = preloaded("us-east-1");
        let other = ctx.for_region("us-west-2").await;
        assert!(!Arc::ptr_eq(&ctx.config, &other.config));
        assert_eq!(other.region(), "us-west-2");
        assert_eq!(
            other.sdk_config().region().map(|r| r.as_ref()),
            Some("us-west-2")
        );
    }
}
