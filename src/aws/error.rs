//! AWS error classification
//!
//! Maps AWS SDK errors onto a small set of categories using the `.code()`
//! metadata instead of string matching on the Debug format, with a narrow
//! fallback for errors that lost their type along the way.

use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// AWS error categories
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { code: String, message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// The AWS error code, when one was found
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. } => Some(code),
            AwsError::Sdk { code, .. } => code.as_deref(),
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["NoSuchBucket", "ResourceNotFoundException"];

/// Codes recognized as the leading token of an untyped root cause
const ALL_KNOWN_CODES: &[&str] = &[
    "NoSuchBucket",
    "ResourceNotFoundException",
    "BucketAlreadyExists",
    "BucketAlreadyOwnedByYou",
    "BucketNotEmpty",
    "AccessDenied",
    "IllegalLocationConstraintException",
    "InvalidLocationConstraint",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Pull code and message out of a cause if it is an `SdkError<E>`.
fn sdk_metadata<E>(cause: &(dyn std::error::Error + 'static)) -> Option<AwsError>
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    cause.downcast_ref::<SdkError<E>>().map(|e| {
        let meta = ProvideErrorMetadata::meta(e);
        let fallback = e.to_string();
        classify_aws_error(meta.code(), Some(meta.message().unwrap_or(&fallback)))
    })
}

/// Classify an `anyhow::Error` by extracting the AWS error code.
///
/// Walks the error chain looking for the SDK operation errors this crate
/// produces. Errors that lost their type are only classified by a leading
/// code token on the root cause or an `ErrorMetadata` code field.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    use aws_sdk_s3::operation::{
        create_bucket::CreateBucketError, delete_bucket::DeleteBucketError,
        delete_objects::DeleteObjectsError, list_object_versions::ListObjectVersionsError,
        list_objects_v2::ListObjectsV2Error, put_bucket_encryption::PutBucketEncryptionError,
        put_bucket_tagging::PutBucketTaggingError,
        put_public_access_block::PutPublicAccessBlockError,
    };
    use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;

    for cause in error.chain() {
        let classified = sdk_metadata::<CreateBucketError>(cause)
            .or_else(|| sdk_metadata::<DeleteBucketError>(cause))
            .or_else(|| sdk_metadata::<ListObjectVersionsError>(cause))
            .or_else(|| sdk_metadata::<ListObjectsV2Error>(cause))
            .or_else(|| sdk_metadata::<DeleteObjectsError>(cause))
            .or_else(|| sdk_metadata::<PutPublicAccessBlockError>(cause))
            .or_else(|| sdk_metadata::<PutBucketEncryptionError>(cause))
            .or_else(|| sdk_metadata::<PutBucketTaggingError>(cause))
            .or_else(|| sdk_metadata::<GetSecretValueError>(cause));
        if let Some(classified) = classified {
            return classified;
        }
    }

    if let Some(code) = extract_error_code(error) {
        return classify_aws_error(Some(&code), Some(&format!("{error:#}")));
    }

    AwsError::Sdk {
        code: None,
        message: format!("{error:#}"),
    }
}

/// Extract an AWS error code from an error that is not an `SdkError`.
///
/// Accepts either a root cause of the form `<Code>` / `<Code>: <message>`
/// with a known code, or a `code: Some("...")` field as printed by
/// `ErrorMetadata`. A code merely mentioned inside a message does not count.
fn extract_error_code(error: &anyhow::Error) -> Option<String> {
    let root = error.root_cause().to_string();
    let leading = root.split(':').next().unwrap_or_default().trim();
    if ALL_KNOWN_CODES.contains(&leading) {
        return Some(leading.to_string());
    }

    let debug_str = format!("{error:?}");
    let start = debug_str.find("code: Some(\"")?;
    let rest = &debug_str[start + 12..];
    rest.find('"').map(|end| rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
            assert_eq!(err.code(), Some(*code));
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("AccessDenied"), Some("denied"));
        assert!(matches!(err, AwsError::Sdk { .. }));
        assert_eq!(err.code(), Some("AccessDenied"));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
        assert_eq!(err2.to_string(), "AWS error: something failed");
    }

    #[test]
    fn classify_plain_anyhow_by_leading_code() {
        let err = anyhow::anyhow!("NoSuchBucket: The specified bucket does not exist");
        assert!(classify_anyhow_error(&err).is_not_found());

        let err = anyhow::anyhow!("connection reset").context("Failed to list objects");
        let classified = classify_anyhow_error(&err);
        assert!(matches!(classified, AwsError::Sdk { code: None, .. }));
        assert!(classified.to_string().contains("connection reset"));
    }

    #[test]
    fn extract_code_from_code_field() {
        let err = anyhow::anyhow!(r#"SdkError {{ code: Some("SomeRandomCode"), message: "fail" }}"#);
        assert_eq!(extract_error_code(&err).as_deref(), Some("SomeRandomCode"));
    }

    #[test]
    fn extract_none_from_unrelated_error() {
        let err = anyhow::anyhow!("connection refused");
        assert!(extract_error_code(&err).is_none());
    }

    #[test]
    fn code_mentioned_in_message_is_not_a_code() {
        let err = anyhow::anyhow!("key NoSuchBucket.txt is locked: AccessDenied")
            .context("Failed to delete objects");
        let classified = classify_anyhow_error(&err);
        assert!(!classified.is_not_found());
        assert_eq!(classified.code(), None);

        let err = anyhow::anyhow!("bucket NoSuchBucket-archive is busy");
        assert!(extract_error_code(&err).is_none());
    }

    #[test]
    fn leading_code_on_wrapped_root_cause() {
        let err = anyhow::anyhow!("NoSuchBucket")
            .context("Failed to list object versions")
            .context("Failed to destroy bucket");
        assert_eq!(extract_error_code(&err).as_deref(), Some("NoSuchBucket"));
        assert!(classify_anyhow_error(&err).is_not_found());
    }
}
