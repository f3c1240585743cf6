//! S3 bucket and object management

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
    PublicAccessBlockConfiguration, ServerSideEncryption, ServerSideEncryptionByDefault,
    ServerSideEncryptionConfiguration, ServerSideEncryptionRule, Tag, Tagging,
};
use tracing::{debug, info};

/// Reference to a stored object, optionally pinned to one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub key: String,
    pub version_id: Option<String>,
}

impl ObjectRef {
    pub fn current(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version_id: None,
        }
    }

    pub fn versioned(key: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version_id: Some(version_id.into()),
        }
    }
}

/// Where to resume a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// ListObjectVersions markers
    Versions {
        key_marker: String,
        version_id_marker: Option<String>,
    },
    /// ListObjectsV2 continuation token
    Continuation(String),
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Object versions (or current objects for the plain listing)
    pub objects: Vec<ObjectRef>,
    /// Delete markers; always empty for the plain listing
    pub delete_markers: Vec<ObjectRef>,
    /// Cursor for the next page, `None` on the last page
    pub next: Option<PageCursor>,
}

/// Trait for S3 operations that can be mocked in tests.
///
/// Note: Some parameters use `Option<String>`/`Vec<_>` instead of borrowed
/// forms to work around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait BucketOperations: Send + Sync {
    /// Create a bucket, with an explicit location constraint when given
    async fn create_bucket(&self, bucket: &str, location_constraint: Option<String>)
    -> Result<()>;

    /// Block every form of public access
    async fn block_public_access(&self, bucket: &str) -> Result<()>;

    /// Enable SSE-S3 default encryption
    async fn enable_default_encryption(&self, bucket: &str) -> Result<()>;

    /// Replace the bucket tag set
    async fn put_bucket_tags(&self, bucket: &str, tags: Vec<(String, String)>) -> Result<()>;

    /// Fetch one page of object versions and delete markers
    async fn list_object_versions(
        &self,
        bucket: &str,
        cursor: Option<PageCursor>,
    ) -> Result<ListingPage>;

    /// Fetch one page of current objects
    async fn list_objects(&self, bucket: &str, cursor: Option<PageCursor>) -> Result<ListingPage>;

    /// Delete up to 1000 objects in one request
    async fn delete_objects(&self, bucket: &str, objects: Vec<ObjectRef>) -> Result<()>;

    /// Delete the (empty) bucket itself
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}

/// S3 client for managing buckets
pub struct S3Client {
    client: Client,
    region: String,
}

impl S3Client {
    /// Create a new S3 client
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create an S3 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
            region: ctx.region().to_string(),
        }
    }

    pub async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<()> {
        info!(bucket = %bucket, region = %self.region, location = ?location_constraint, "Creating S3 bucket");

        let mut request = self.client.create_bucket().bucket(bucket);

        if let Some(location) = location_constraint {
            let create_config = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(location))
                .build();
            request = request.create_bucket_configuration(create_config);
        }

        request.send().await.context("Failed to create bucket")?;

        Ok(())
    }

    pub async fn block_public_access(&self, bucket: &str) -> Result<()> {
        debug!(bucket = %bucket, "Blocking public access");

        let config = PublicAccessBlockConfiguration::builder()
            .block_public_acls(true)
            .ignore_public_acls(true)
            .block_public_policy(true)
            .restrict_public_buckets(true)
            .build();

        self.client
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(config)
            .send()
            .await
            .context("Failed to put public access block")?;

        Ok(())
    }

    pub async fn enable_default_encryption(&self, bucket: &str) -> Result<()> {
        debug!(bucket = %bucket, "Enabling default encryption");

        let by_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(ServerSideEncryption::Aes256)
            .build()?;
        let rule = ServerSideEncryptionRule::builder()
            .apply_server_side_encryption_by_default(by_default)
            .build();
        let config = ServerSideEncryptionConfiguration::builder()
            .rules(rule)
            .build()?;

        self.client
            .put_bucket_encryption()
            .bucket(bucket)
            .server_side_encryption_configuration(config)
            .send()
            .await
            .context("Failed to put bucket encryption")?;

        Ok(())
    }

    pub async fn put_bucket_tags(&self, bucket: &str, tag_set: &[(String, String)]) -> Result<()> {
        debug!(bucket = %bucket, tags = ?tag_set, "Tagging bucket");

        let mut builder = Tagging::builder();
        for (key, value) in tag_set {
            builder = builder.tag_set(Tag::builder().key(key).value(value).build()?);
        }

        self.client
            .put_bucket_tagging()
            .bucket(bucket)
            .tagging(builder.build()?)
            .send()
            .await
            .context("Failed to put bucket tagging")?;

        Ok(())
    }

    pub async fn list_object_versions(
        &self,
        bucket: &str,
        cursor: Option<&PageCursor>,
    ) -> Result<ListingPage> {
        let mut request = self.client.list_object_versions().bucket(bucket);

        if let Some(PageCursor::Versions {
            key_marker,
            version_id_marker,
        }) = cursor
        {
            request = request
                .key_marker(key_marker)
                .set_version_id_marker(version_id_marker.clone());
        }

        let response = request
            .send()
            .await
            .context("Failed to list object versions")?;

        let objects = response
            .versions()
            .iter()
            .filter_map(|v| Some(versioned_ref(v.key()?, v.version_id())))
            .collect();
        let delete_markers = response
            .delete_markers()
            .iter()
            .filter_map(|m| Some(versioned_ref(m.key()?, m.version_id())))
            .collect();

        let next = match (response.is_truncated(), response.next_key_marker()) {
            (Some(true), Some(key_marker)) => Some(PageCursor::Versions {
                key_marker: key_marker.to_string(),
                version_id_marker: response.next_version_id_marker().map(str::to_string),
            }),
            _ => None,
        };

        Ok(ListingPage {
            objects,
            delete_markers,
            next,
        })
    }

    pub async fn list_objects(
        &self,
        bucket: &str,
        cursor: Option<&PageCursor>,
    ) -> Result<ListingPage> {
        let mut request = self.client.list_objects_v2().bucket(bucket);

        if let Some(PageCursor::Continuation(token)) = cursor {
            request = request.continuation_token(token);
        }

        let response = request.send().await.context("Failed to list objects")?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|o| o.key().map(ObjectRef::current))
            .collect();

        let next = if response.is_truncated() == Some(true) {
            response
                .next_continuation_token()
                .map(|t| PageCursor::Continuation(t.to_string()))
        } else {
            None
        };

        Ok(ListingPage {
            objects,
            delete_markers: Vec::new(),
            next,
        })
    }

    pub async fn delete_objects(&self, bucket: &str, objects: &[ObjectRef]) -> Result<()> {
        if objects.is_empty() {
            return Ok(());
        }
        debug!(bucket = %bucket, count = objects.len(), "Deleting objects");

        let identifiers = objects
            .iter()
            .map(|o| {
                ObjectIdentifier::builder()
                    .key(&o.key)
                    .set_version_id(o.version_id.clone())
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()?;

        let response = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .context("Failed to delete objects")?;

        if let Some(first) = response.errors().first() {
            anyhow::bail!(
                "Failed to delete {} object(s), first: {} ({}): {}",
                response.errors().len(),
                first.key().unwrap_or("<unknown>"),
                first.code().unwrap_or("<no code>"),
                first.message().unwrap_or("<no message>"),
            );
        }

        Ok(())
    }

    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        info!(bucket = %bucket, "Deleting bucket");

        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .context("Failed to delete bucket")?;

        Ok(())
    }
}

fn versioned_ref(key: &str, version_id: Option<&str>) -> ObjectRef {
    ObjectRef {
        key: key.to_string(),
        version_id: version_id.map(str::to_string),
    }
}

impl BucketOperations for S3Client {
    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<String>,
    ) -> Result<()> {
        S3Client::create_bucket(self, bucket, location_constraint.as_deref()).await
    }

    async fn block_public_access(&self, bucket: &str) -> Result<()> {
        S3Client::block_public_access(self, bucket).await
    }

    async fn enable_default_encryption(&self, bucket: &str) -> Result<()> {
        S3Client::enable_default_encryption(self, bucket).await
    }

    async fn put_bucket_tags(&self, bucket: &str, tags: Vec<(String, String)>) -> Result<()> {
        S3Client::put_bucket_tags(self, bucket, &tags).await
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
        cursor: Option<PageCursor>,
    ) -> Result<ListingPage> {
        S3Client::list_object_versions(self, bucket, cursor.as_ref()).await
    }

    async fn list_objects(&self, bucket: &str, cursor: Option<PageCursor>) -> Result<ListingPage> {
        S3Client::list_objects(self, bucket, cursor.as_ref()).await
    }

    async fn delete_objects(&self, bucket: &str, objects: Vec<ObjectRef>) -> Result<()> {
        S3Client::delete_objects(self, bucket, &objects).await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        S3Client::delete_bucket(self, bucket).await
    }
}
