//! Bucket tags applied by hardening
//!
//! ## Tag Schema
//!
//! | Tag Key | Value |
//! |---------|-------|
//! | `owner` | `automation` |
//! | `env`   | `prod` |

/// Tag key identifying who manages the bucket
pub const TAG_OWNER: &str = "owner";

/// Tag value for buckets created by this tool
pub const TAG_OWNER_VALUE: &str = "automation";

/// Tag key for the deployment environment
pub const TAG_ENV: &str = "env";

/// Environment tag value
pub const TAG_ENV_VALUE: &str = "prod";

/// The fixed tag set written during hardening, in order
pub const HARDENING_TAGS: &[(&str, &str)] = &[(TAG_OWNER, TAG_OWNER_VALUE), (TAG_ENV, TAG_ENV_VALUE)];

/// Hardening tags as owned pairs, as taken by `BucketOperations::put_bucket_tags`
pub fn hardening_tags() -> Vec<(String, String)> {
    HARDENING_TAGS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
