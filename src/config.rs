//! Configuration shared by both invocation adapters

/// Region used when a request does not name one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Leading segment of generated bucket names
pub const DEFAULT_BUCKET_PREFIX: &str = "learn";

/// Per-deployment settings for [`crate::service::execute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Prefix for generated bucket names
    pub bucket_prefix: String,
    /// Apply public-access block, encryption and tags after create
    pub harden: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bucket_prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            harden: false,
        }
    }
}

impl ServiceConfig {
    pub fn new(bucket_prefix: impl Into<String>, harden: bool) -> Self {
        Self {
            bucket_prefix: bucket_prefix.into(),
            harden,
        }
    }
}
