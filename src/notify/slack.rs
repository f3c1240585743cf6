//! Slack `chat.postMessage` transport

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Slack Web API endpoint for posting messages
pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Upper bound on one post, connect included
pub const DEFAULT_POST_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for chat delivery that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait ChatTransport: Send + Sync {
    /// Post `text` to `channel`, authenticating with `token`
    async fn post_message(&self, token: &str, channel: &str, text: &str) -> Result<()>;
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Acknowledgement body returned by the Slack Web API
#[derive(Debug, Deserialize)]
struct SlackAck {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the Slack Web API
pub struct SlackClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SlackClient {
    /// Client for the public Slack API with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_endpoint(SLACK_POST_MESSAGE_URL, DEFAULT_POST_TIMEOUT)
    }

    /// Client posting to `endpoint`, giving up after `timeout`
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub async fn post_message(&self, token: &str, channel: &str, text: &str) -> Result<()> {
        debug!(channel = %channel, "Posting Slack message");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&PostMessage { channel, text })
            .send()
            .await
            .context("Slack request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Slack returned HTTP {status}");
        }

        let ack: SlackAck = response
            .json()
            .await
            .context("Failed to parse Slack response")?;

        if !ack.ok {
            anyhow::bail!(
                "Slack error: {}",
                ack.error.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(())
    }
}

impl ChatTransport for SlackClient {
    async fn post_message(&self, token: &str, channel: &str, text: &str) -> Result<()> {
        SlackClient::post_message(self, token, channel, text).await
    }
}
