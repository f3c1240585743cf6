//! Lifecycle error kinds
//!
//! These are the `error` values callers see in a failed [`LifecycleResult`].
//! Provider failures are carried as opaque text; only a missing bucket gets
//! its own kind so destroy retries can tell it apart.
//!
//! [`LifecycleResult`]: crate::lifecycle::LifecycleResult

use crate::aws::classify_anyhow_error;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Create was asked for a name that breaks bucket naming rules
    #[error("invalid_bucket_name")]
    InvalidBucketName,

    /// Destroy was called without a usable bucket name
    #[error("name_required")]
    NameRequired,

    /// The event named an action other than create or destroy
    #[error("unknown_action")]
    UnknownAction,

    /// The bucket does not exist (S3 `NoSuchBucket`)
    #[error("no_such_bucket")]
    NoSuchBucket,

    /// Any other storage provider failure, as human-readable text
    #[error("{0}")]
    Provider(String),
}

impl LifecycleError {
    /// Convert a provider error into a lifecycle error kind.
    pub fn from_provider(error: &anyhow::Error) -> Self {
        let classified = classify_anyhow_error(error);
        if classified.is_not_found() && classified.code() == Some("NoSuchBucket") {
            LifecycleError::NoSuchBucket
        } else {
            LifecycleError::Provider(format!("{error:#}"))
        }
    }
}
