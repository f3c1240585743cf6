//! Bucket lifecycle: create (optionally hardened) and destroy (drain, then delete)
//!
//! Provider errors never escape this module as `Err`; every operation
//! returns a [`LifecycleResult`] describing success or the failure kind.

pub mod drain;

pub use drain::{DrainReport, DrainStrategy, MAX_DELETE_BATCH, drain_bucket};

use crate::aws::BucketOperations;
use crate::aws::tags::hardening_tags;
use crate::error::LifecycleError;
use crate::naming::BucketName;
use anyhow::Result;
use serde::Serialize;
use tracing::{error, info, warn};

/// S3's default region. CreateBucket must not carry a LocationConstraint
/// here or S3 rejects the request.
pub const DEFAULT_PROVIDER_REGION: &str = "us-east-1";

/// Outcome of one create or destroy invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LifecycleResult {
    pub fn success(bucket: &BucketName, region: &str) -> Self {
        Self {
            ok: true,
            bucket: Some(bucket.to_string()),
            region: Some(region.to_string()),
            error: None,
        }
    }

    pub fn failure(error: &LifecycleError) -> Self {
        Self {
            ok: false,
            bucket: None,
            region: None,
            error: Some(error.to_string()),
        }
    }
}

/// The LocationConstraint to send for `region`, if any
pub fn location_constraint_for(region: &str) -> Option<String> {
    (region != DEFAULT_PROVIDER_REGION).then(|| region.to_string())
}

/// Creates and destroys buckets through a [`BucketOperations`] backend.
pub struct BucketManager<'a, O: BucketOperations> {
    ops: &'a O,
}

impl<'a, O: BucketOperations> BucketManager<'a, O> {
    pub fn new(ops: &'a O) -> Self {
        Self { ops }
    }

    /// Create `name` in `region`, then harden it when asked.
    ///
    /// Hardening runs public-access block, default encryption and tagging in
    /// that order. A failure part way leaves the bucket created with whatever
    /// hardening already applied; nothing is rolled back.
    pub async fn create(&self, name: &BucketName, region: &str, hardened: bool) -> LifecycleResult {
        let result = async {
            self.ops
                .create_bucket(name.as_str(), location_constraint_for(region))
                .await?;
            if hardened {
                self.harden(name).await?;
            }
            Ok::<_, anyhow::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                info!(bucket = %name, region = %region, hardened, "Bucket created");
                LifecycleResult::success(name, region)
            }
            Err(e) => {
                error!(bucket = %name, region = %region, error = ?e, "Bucket creation failed");
                LifecycleResult::failure(&LifecycleError::from_provider(&e))
            }
        }
    }

    async fn harden(&self, name: &BucketName) -> Result<()> {
        let bucket = name.as_str();
        self.ops.block_public_access(bucket).await?;
        self.ops.enable_default_encryption(bucket).await?;
        self.ops.put_bucket_tags(bucket, hardening_tags()).await
    }

    /// Empty `name` with every drain strategy, then delete it.
    ///
    /// Safe to retry: a partially drained bucket drains the rest on the next
    /// call. A bucket that no longer exists yields `no_such_bucket`.
    pub async fn destroy(&self, name: &BucketName, region: &str) -> LifecycleResult {
        self.destroy_with(name, region, &DrainStrategy::DEFAULT_ORDER)
            .await
    }

    /// [`destroy`](Self::destroy) with an explicit set of drain passes.
    pub async fn destroy_with(
        &self,
        name: &BucketName,
        region: &str,
        strategies: &[DrainStrategy],
    ) -> LifecycleResult {
        let result = async {
            let mut report = DrainReport::default();
            for strategy in strategies {
                report += drain_bucket(self.ops, name.as_str(), *strategy).await?;
            }
            info!(
                bucket = %name,
                objects = report.objects,
                delete_markers = report.delete_markers,
                pages = report.pages,
                "Bucket drained"
            );
            self.ops.delete_bucket(name.as_str()).await
        }
        .await;

        match result {
            Ok(()) => {
                info!(bucket = %name, region = %region, "Bucket deleted");
                LifecycleResult::success(name, region)
            }
            Err(e) => {
                let kind = LifecycleError::from_provider(&e);
                if kind == LifecycleError::NoSuchBucket {
                    warn!(bucket = %name, region = %region, "Bucket does not exist");
                } else {
                    error!(bucket = %name, region = %region, error = ?e, "Bucket deletion failed");
                }
                LifecycleResult::failure(&kind)
            }
        }
    }
}
