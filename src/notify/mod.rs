//! Best-effort chat notifications
//!
//! A notification is always secondary to the bucket operation it reports:
//! [`Notifier::notify`] never returns an error, it logs and reports an
//! outcome instead.

pub mod credentials;
pub mod slack;

pub use credentials::{CredentialCache, NotificationCredentials, SecretPayloadError};
pub use slack::{ChatTransport, DEFAULT_POST_TIMEOUT, SLACK_POST_MESSAGE_URL, SlackClient};

#[cfg(test)]
pub use slack::MockChatTransport;

use crate::aws::SecretSource;
use crate::naming::BucketName;
use anyhow::Context;
use std::fmt;
use tracing::{info, warn};

/// Why a notification was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No secret id configured
    NotConfigured,
    /// The secret could not be fetched or parsed
    CredentialsUnavailable,
    /// The secret holds an empty token
    MissingToken,
    /// Neither an override nor a default channel
    NoChannel,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::NotConfigured => "slack not configured",
            SkipReason::CredentialsUnavailable => "slack credentials unavailable",
            SkipReason::MissingToken => "missing slack token",
            SkipReason::NoChannel => "no slack channel",
        })
    }
}

/// What happened to a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    Skipped(SkipReason),
    Failed(String),
}

fn skipped(reason: SkipReason) -> NotifyOutcome {
    info!(reason = %reason, "Skipping Slack notification");
    NotifyOutcome::Skipped(reason)
}

/// Message announcing a created bucket
pub fn created_message(bucket: &BucketName, region: &str) -> String {
    format!(":white_check_mark: S3 bucket *{bucket}* created in `{region}`.")
}

/// Message announcing a deleted bucket
pub fn deleted_message(bucket: &BucketName, region: &str) -> String {
    format!(":wastebasket: S3 bucket *{bucket}* deleted from `{region}`.")
}

/// Posts status messages using credentials from a secret store.
///
/// Holds the [`CredentialCache`], so one long-lived notifier should serve
/// every invocation of a warm process.
pub struct Notifier<S: SecretSource, C: ChatTransport> {
    secret_id: Option<String>,
    secrets: S,
    chat: C,
    cache: CredentialCache,
}

impl<S: SecretSource, C: ChatTransport> Notifier<S, C> {
    pub fn new(secret_id: Option<String>, secrets: S, chat: C) -> Self {
        Self {
            secret_id: secret_id.filter(|id| !id.is_empty()),
            secrets,
            chat,
            cache: CredentialCache::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_id.is_some()
    }

    /// Post `text`, to `channel_override` if given, else the secret's default channel.
    pub async fn notify(&self, text: &str, channel_override: Option<&str>) -> NotifyOutcome {
        let Some(secret_id) = self.secret_id.as_deref() else {
            return skipped(SkipReason::NotConfigured);
        };

        let creds = match self
            .cache
            .get_or_load(|| async {
                let value = self.secrets.secret_string(secret_id).await?;
                NotificationCredentials::from_secret(&value).context("Failed to parse Slack secret")
            })
            .await
        {
            Ok(creds) => creds,
            Err(e) => {
                warn!(error = ?e, "Could not load Slack credentials");
                return skipped(SkipReason::CredentialsUnavailable);
            }
        };

        if creds.token.is_empty() {
            return skipped(SkipReason::MissingToken);
        }

        let channel = channel_override
            .filter(|c| !c.is_empty())
            .or(creds.default_channel.as_deref());
        let Some(channel) = channel else {
            return skipped(SkipReason::NoChannel);
        };

        match self.chat.post_message(&creds.token, channel, text).await {
            Ok(()) => {
                info!(channel = %channel, "Slack notification sent");
                NotifyOutcome::Sent
            }
            Err(e) => {
                warn!(channel = %channel, error = ?e, "Slack notification failed");
                NotifyOutcome::Failed(format!("{e:#}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockSecretSource;
    use mockall::predicate::eq;

    fn secrets_returning(value: &'static str) -> MockSecretSource {
        let mut secrets = MockSecretSource::new();
        secrets
            .expect_secret_string()
            .with(eq("arn:slack"))
            .returning(move |_| Ok(value.to_string()));
        secrets
    }

    #[test]
    fn message_texts() {
        let bucket = BucketName::parse("demo-bucket").unwrap();
        assert_eq!(
            created_message(&bucket, "us-west-2"),
            ":white_check_mark: S3 bucket *demo-bucket* created in `us-west-2`."
        );
        assert_eq!(
            deleted_message(&bucket, "us-east-1"),
            ":wastebasket: S3 bucket *demo-bucket* deleted from `us-east-1`."
        );
    }

    #[tokio::test]
    async fn skips_without_secret_id() {
        let mut secrets = MockSecretSource::new();
        secrets.expect_secret_string().never();
        let mut chat = MockChatTransport::new();
        chat.expect_post_message().never();

        let notifier = Notifier::new(None, secrets, chat);
        assert!(!notifier.is_configured());
        assert_eq!(
            notifier.notify("hi", Some("#c")).await,
            NotifyOutcome::Skipped(SkipReason::NotConfigured)
        );
    }

    #[tokio::test]
    async fn override_channel_wins() {
        let mut chat = MockChatTransport::new();
        chat.expect_post_message()
            .with(eq("xoxb-1"), eq("#override"), eq("hi"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let notifier = Notifier::new(
            Some("arn:slack".to_string()),
            secrets_returning(r##"{"bot_token":"xoxb-1","channel":"#default"}"##),
            chat,
        );
        assert_eq!(notifier.notify("hi", Some("#override")).await, NotifyOutcome::Sent);
    }

    #[tokio::test]
    async fn falls_back_to_default_channel() {
        let mut chat = MockChatTransport::new();
        chat.expect_post_message()
            .with(eq("xoxb-1"), eq("#default"), eq("hi"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let notifier = Notifier::new(
            Some("arn:slack".to_string()),
            secrets_returning(r##"{"bot_token":"xoxb-1","channel":"#default"}"##),
            chat,
        );
        assert_eq!(notifier.notify("hi", None).await, NotifyOutcome::Sent);
    }

    #[tokio::test]
    async fn raw_token_without_channel_is_skipped() {
        let mut chat = MockChatTransport::new();
        chat.expect_post_message().never();

        let notifier = Notifier::new(
            Some("arn:slack".to_string()),
            secrets_returning("xoxb-raw"),
            chat,
        );
        assert_eq!(
            notifier.notify("hi", None).await,
            NotifyOutcome::Skipped(SkipReason::NoChannel)
        );
        assert!(notifier.cache.is_populated().await);
    }

    #[tokio::test]
    async fn secret_is_fetched_once() {
        let mut secrets = MockSecretSource::new();
        secrets
            .expect_secret_string()
            .times(1)
            .returning(|_| Ok("xoxb-once".to_string()));
        let mut chat = MockChatTransport::new();
        chat.expect_post_message()
            .times(3)
            .returning(|_, _, _| Ok(()));

        let notifier = Notifier::new(Some("arn:slack".to_string()), secrets, chat);
        for _ in 0..3 {
            assert_eq!(notifier.notify("hi", Some("C1")).await, NotifyOutcome::Sent);
        }
    }

    #[tokio::test]
    async fn secret_failure_is_a_skip() {
        let mut secrets = MockSecretSource::new();
        secrets
            .expect_secret_string()
            .returning(|_| Err(anyhow::anyhow!("ResourceNotFoundException")));
        let mut chat = MockChatTransport::new();
        chat.expect_post_message().never();

        let notifier = Notifier::new(Some("arn:slack".to_string()), secrets, chat);
        assert_eq!(
            notifier.notify("hi", Some("C1")).await,
            NotifyOutcome::Skipped(SkipReason::CredentialsUnavailable)
        );
        assert!(!notifier.cache.is_populated().await);
    }

    #[tokio::test]
    async fn empty_token_is_a_skip() {
        let mut chat = MockChatTransport::new();
        chat.expect_post_message().never();

        let notifier = Notifier::new(
            Some("arn:slack".to_string()),
            secrets_returning(r#"{"bot_token":"","channel":"C1"}"#),
            chat,
        );
        assert_eq!(
            notifier.notify("hi", None).await,
            NotifyOutcome::Skipped(SkipReason::MissingToken)
        );
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_not_raised() {
        let mut chat = MockChatTransport::new();
        chat.expect_post_message()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("Slack returned HTTP 500")));

        let notifier = Notifier::new(
            Some("arn:slack".to_string()),
            secrets_returning("xoxb-1"),
            chat,
        );
        match notifier.notify("hi", Some("C1")).await {
            NotifyOutcome::Failed(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
