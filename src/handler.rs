//! Event payload adapter for the serverless deployment
//!
//! Turns a JSON event into a [`BucketRequest`] and runs it. Storage clients
//! are region-bound, so the caller supplies a constructor that is invoked
//! once the target region is known.

use crate::aws::{BucketOperations, SecretSource};
use crate::config::ServiceConfig;
use crate::error::LifecycleError;
use crate::lifecycle::LifecycleResult;
use crate::notify::{ChatTransport, Notifier};
use crate::request::{Action, BucketRequest};
use crate::service;
use serde::Deserialize;
use tracing::{info, warn};

/// Incoming event payload. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BucketEvent {
    /// `create` (default) or `destroy`, any case
    pub action: Option<String>,
    pub name: Option<String>,
    /// Hint for generated names
    pub user: Option<String>,
    pub region: Option<String>,
    /// `null` and absent both mean no notification
    pub notify: Option<bool>,
    pub slack_channel: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl BucketEvent {
    /// Resolve defaults and build the request. Empty strings count as absent.
    pub fn into_request(self, default_region: &str) -> Result<BucketRequest, LifecycleError> {
        let action = Action::parse_optional(self.action.as_deref())?;
        let region = non_empty(self.region).unwrap_or_else(|| default_region.to_string());

        Ok(BucketRequest {
            action,
            name: non_empty(self.name),
            region,
            naming_hint: non_empty(self.user),
            notify: self.notify.unwrap_or(false),
            notify_channel_override: non_empty(self.slack_channel),
        })
    }
}

/// Process-lifetime state reused across warm invocations
pub struct HandlerState<S: SecretSource, C: ChatTransport> {
    pub config: ServiceConfig,
    pub default_region: String,
    pub notifier: Notifier<S, C>,
}

/// Handle one event. `ops_for_region` builds the storage client for the
/// resolved region; it is not called for events rejected up front.
pub async fn handle_event<O, S, C, F, Fut>(
    event: BucketEvent,
    state: &HandlerState<S, C>,
    ops_for_region: F,
) -> LifecycleResult
where
    O: BucketOperations,
    S: SecretSource,
    C: ChatTransport,
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = O>,
{
    let request = match event.into_request(&state.default_region) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected event");
            return LifecycleResult::failure(&e);
        }
    };

    info!(
        action = %request.action,
        region = %request.region,
        notify = request.notify,
        "Handling event"
    );

    let ops = ops_for_region(request.region.clone()).await;
    service::execute(&ops, &state.notifier, &state.config, &request).await
}
