//! AWS service clients
//!
//! Thin wrappers around the AWS SDK clients:
//! - S3: bucket creation, hardening, listing and deletion
//! - Secrets Manager: chat credentials lookup

pub mod context;
pub mod error;
pub mod s3;
pub mod secrets;
pub mod tags;

pub use context::AwsContext;
pub use error::{AwsError, classify_anyhow_error, classify_aws_error};
pub use s3::{BucketOperations, ListingPage, ObjectRef, PageCursor, S3Client};
pub use secrets::{SecretSource, SecretsClient};

#[cfg(test)]
pub use s3::MockBucketOperations;
#[cfg(test)]
pub use secrets::MockSecretSource;
