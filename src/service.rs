//! One invocation, start to finish
//!
//! Both adapters funnel into [`execute`]: resolve and validate the bucket
//! name, run exactly one lifecycle operation, then notify if asked and the
//! operation succeeded. The notification outcome never changes the result.

use crate::aws::{BucketOperations, SecretSource};
use crate::config::ServiceConfig;
use crate::error::LifecycleError;
use crate::lifecycle::{BucketManager, LifecycleResult};
use crate::naming::{self, BucketName};
use crate::notify::{self, ChatTransport, Notifier};
use crate::request::{Action, BucketRequest};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

/// Run `request` against `ops`, dating generated names today (UTC).
pub async fn execute<O, S, C>(
    ops: &O,
    notifier: &Notifier<S, C>,
    config: &ServiceConfig,
    request: &BucketRequest,
) -> LifecycleResult
where
    O: BucketOperations,
    S: SecretSource,
    C: ChatTransport,
{
    execute_on(ops, notifier, config, request, Utc::now().date_naive()).await
}

/// [`execute`] with an explicit date for generated names.
pub async fn execute_on<O, S, C>(
    ops: &O,
    notifier: &Notifier<S, C>,
    config: &ServiceConfig,
    request: &BucketRequest,
    today: NaiveDate,
) -> LifecycleResult
where
    O: BucketOperations,
    S: SecretSource,
    C: ChatTransport,
{
    let region = request.region.as_str();
    let manager = BucketManager::new(ops);

    let (name, result) = match request.action {
        Action::Create => {
            let name = match create_name(config, request, today) {
                Ok(name) => name,
                Err(e) => return rejected(request, e),
            };
            info!(bucket = %name, region = %region, "Creating bucket");
            let result = manager.create(&name, region, config.harden).await;
            (name, result)
        }
        Action::Destroy => {
            let name = match destroy_name(request) {
                Ok(name) => name,
                Err(e) => return rejected(request, e),
            };
            info!(bucket = %name, region = %region, "Destroying bucket");
            let result = manager.destroy(&name, region).await;
            (name, result)
        }
    };

    if result.ok && request.notify {
        let text = match request.action {
            Action::Create => notify::created_message(&name, region),
            Action::Destroy => notify::deleted_message(&name, region),
        };
        let outcome = notifier
            .notify(&text, request.notify_channel_override.as_deref())
            .await;
        info!(bucket = %name, outcome = ?outcome, "Notification handled");
    }

    result
}

/// The explicit name if one was given, else a generated one.
///
/// Kept synchronous so the thread RNG never lives across an await.
fn create_name(
    config: &ServiceConfig,
    request: &BucketRequest,
    today: NaiveDate,
) -> Result<BucketName, LifecycleError> {
    match request.name.as_deref() {
        Some(explicit) => {
            BucketName::parse(explicit).map_err(|_| LifecycleError::InvalidBucketName)
        }
        None => Ok(naming::generate_default(
            request.naming_hint.as_deref(),
            &config.bucket_prefix,
            &request.region,
            today,
            &mut rand::thread_rng(),
        )),
    }
}

fn destroy_name(request: &BucketRequest) -> Result<BucketName, LifecycleError> {
    request
        .name
        .as_deref()
        .and_then(|name| BucketName::parse(name).ok())
        .ok_or(LifecycleError::NameRequired)
}

fn rejected(request: &BucketRequest, error: LifecycleError) -> LifecycleResult {
    warn!(
        action = %request.action,
        name = ?request.name,
        error = %error,
        "Request rejected"
    );
    LifecycleResult::failure(&error)
}
