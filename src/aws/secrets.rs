//! Secrets Manager access

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use tracing::debug;

/// Trait for secret lookups that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait SecretSource: Send + Sync {
    /// Fetch the string value of a secret by id or ARN
    async fn secret_string(&self, secret_id: &str) -> Result<String>;
}

/// Secrets Manager client
pub struct SecretsClient {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.secrets_client(),
        }
    }

    pub async fn secret_string(&self, secret_id: &str) -> Result<String> {
        debug!(secret_id = %secret_id, "Fetching secret");

        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .context("Failed to get secret value")?;

        response
            .secret_string()
            .map(str::to_string)
            .with_context(|| format!("Secret {secret_id} has no string value"))
    }
}

impl SecretSource for SecretsClient {
    async fn secret_string(&self, secret_id: &str) -> Result<String> {
        SecretsClient::secret_string(self, secret_id).await
    }
}
