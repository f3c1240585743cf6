//! Slack credentials and their process-wide cache

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

/// Bot token plus the channel to post to when the caller names none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCredentials {
    pub token: String,
    pub default_channel: Option<String>,
}

/// A secret payload that could not be turned into credentials
#[derive(Debug, Error)]
pub enum SecretPayloadError {
    #[error("secret payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("secret payload has no bot_token field")]
    MissingToken,
}

#[derive(Deserialize)]
struct StructuredSecret {
    #[serde(alias = "token")]
    bot_token: Option<String>,
    channel: Option<String>,
}

impl NotificationCredentials {
    /// Parse a secret value.
    ///
    /// A value starting with `{` is JSON `{"bot_token": "...", "channel": "..."}`
    /// (`token` is accepted for `bot_token`); anything else is the raw token.
    pub fn from_secret(value: &str) -> Result<Self, SecretPayloadError> {
        let trimmed = value.trim();
        if !trimmed.starts_with('{') {
            return Ok(Self {
                token: trimmed.to_string(),
                default_channel: None,
            });
        }

        let parsed: StructuredSecret = serde_json::from_str(trimmed)?;
        Ok(Self {
            token: parsed.bot_token.ok_or(SecretPayloadError::MissingToken)?,
            default_channel: parsed.channel.filter(|c| !c.is_empty()),
        })
    }
}

enum CacheSlot {
    Unpopulated,
    Populated(NotificationCredentials),
}

/// Credentials loaded at most once per process.
///
/// Once populated the entry is never refreshed; a cold start is the only
/// reset. A failed load leaves the cache unpopulated.
pub struct CredentialCache {
    slot: Mutex<CacheSlot>,
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialCache {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(CacheSlot::Unpopulated),
        }
    }

    pub async fn is_populated(&self) -> bool {
        matches!(*self.slot.lock().await, CacheSlot::Populated(_))
    }

    /// Return the cached credentials, running `load` on first use.
    pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<NotificationCredentials, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<NotificationCredentials, E>>,
    {
        let mut slot = self.slot.lock().await;
        if let CacheSlot::Populated(creds) = &*slot {
            return Ok(creds.clone());
        }

        let creds = load().await?;
        *slot = CacheSlot::Populated(creds.clone());
        Ok(creds)
    }
}
