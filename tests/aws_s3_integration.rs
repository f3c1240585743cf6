//! S3 integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_s3_integration -- --ignored
//! ```


use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketVersioningStatus, VersioningConfiguration};
use aws_test_helpers::*;
use bucketctl::aws::{AwsContext, S3Client};
use bucketctl::lifecycle::BucketManager;

/// Create, fill with versions and delete markers, destroy
#[tokio::test]
#[ignore]
async fn test_versioned_bucket_lifecycle() {
    let region = get_test_region();
    let aws = AwsContext::new(&region).await;
    let client = S3Client::from_context(&aws);
    let raw = aws.s3_client();
    let manager = BucketManager::new(&client);
    let bucket = test_bucket_name(&region);

    let created = manager.create(&bucket, &region, true).await;
    assert!(created.ok, "create failed: {:?}", created.error);

    raw.put_bucket_versioning()
        .bucket(bucket.as_str())
        .versioning_configuration(
            VersioningConfiguration::builder()
                .status(BucketVersioningStatus::Enabled)
                .build(),
        )
        .send()
        .await
        .expect("Should enable versioning");

    for body in ["one", "two", "three"] {
        raw.put_object()
            .bucket(bucket.as_str())
            .key("history.txt")
            .body(ByteStream::from_static(body.as_bytes()))
            .send()
            .await
            .expect("Should upload object");
    }
    // Leaves a delete marker on top of the versions
    raw.delete_object()
        .bucket(bucket.as_str())
        .key("history.txt")
        .send()
        .await
        .expect("Should delete object");

    let destroyed = manager.destroy(&bucket, &region).await;
    assert!(destroyed.ok, "destroy failed: {:?}", destroyed.error);

    let again = manager.destroy(&bucket, &region).await;
    assert_eq!(again.error.as_deref(), Some("no_such_bucket"));
}

/// Plain bucket in the default region, no hardening
#[tokio::test]
#[ignore]
async fn test_unversioned_bucket_lifecycle() {
    let region = get_test_region();
    let client = S3Client::new(&region)
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");
    let manager = BucketManager::new(&client);
    let bucket = test_bucket_name(&region);

    assert!(manager.create(&bucket, &region, false).await.ok);

    let destroyed = manager.destroy(&bucket, &region).await;
    assert!(destroyed.ok, "destroy failed: {:?}", destroyed.error);
}
