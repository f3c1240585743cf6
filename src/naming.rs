//! Bucket name validation and generation
//!
//! S3 bucket names must be 3-63 characters of lowercase letters, digits and
//! hyphens, must begin and end with a letter or digit, and must not look like
//! an IPv4 address. Dots are legal for S3 but are rejected here because they
//! break virtual-hosted TLS certificates.

use chrono::NaiveDate;
use rand::Rng;
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Minimum bucket name length
pub const MIN_NAME_LEN: usize = 3;

/// Maximum bucket name length
pub const MAX_NAME_LEN: usize = 63;

/// Length of the random suffix appended to generated names
pub const SUFFIX_LEN: usize = 6;

/// Segment substituted when a naming hint sanitizes to nothing
pub const FALLBACK_HINT: &str = "bucket";

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Sequences S3 rejects even though every individual character is allowed.
const FORBIDDEN_SEQUENCES: &[&str] = &["..", "_.", ".-", "-."];

/// A name that failed bucket naming rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid bucket name: {0:?}")]
pub struct InvalidBucketName(pub String);

/// A bucket name that satisfies [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    /// Parse and validate a bucket name
    pub fn parse(name: impl Into<String>) -> Result<Self, InvalidBucketName> {
        let name = name.into();
        if validate(&name) {
            Ok(Self(name))
        } else {
            Err(InvalidBucketName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for BucketName {
    type Err = InvalidBucketName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Check a candidate bucket name against the naming rules.
pub fn validate(name: &str) -> bool {
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.len()) {
        return false;
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return false;
    }

    if name.starts_with('-') || name.ends_with('-') {
        return false;
    }

    if FORBIDDEN_SEQUENCES.iter().any(|seq| name.contains(seq)) {
        return false;
    }

    name.parse::<Ipv4Addr>().is_err()
}

/// Lowercase `input` and collapse every run of characters outside
/// `[a-z0-9-]` into a single hyphen, trimming hyphens at both ends.
///
/// Returns an empty string when nothing usable remains.
pub fn sanitize_segment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Draw a random `[a-z0-9]` suffix of [`SUFFIX_LEN`] characters.
pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Build a bucket name of the form `<prefix>-<hint>-<region>-<YYYYMMDD>-<suffix>`.
///
/// Every segment is sanitized; the hint falls back to [`FALLBACK_HINT`] and
/// an empty prefix or region is dropped. The result is cut to
/// [`MAX_NAME_LEN`] characters with any trailing hyphen removed.
pub fn generate_default<R: Rng + ?Sized>(
    hint: Option<&str>,
    prefix: &str,
    region: &str,
    date: NaiveDate,
    rng: &mut R,
) -> BucketName {
    let hint = match sanitize_segment(hint.unwrap_or_default()) {
        h if h.is_empty() => FALLBACK_HINT.to_string(),
        h => h,
    };

    let segments = [
        sanitize_segment(prefix),
        hint,
        sanitize_segment(region),
        date.format("%Y%m%d").to_string(),
        random_suffix(rng),
    ];

    let mut name = segments
        .iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("-");

    // Every segment is ASCII at this point, so byte truncation is safe.
    name.truncate(MAX_NAME_LEN);
    let name = name.trim_end_matches('-').to_string();

    debug_assert!(validate(&name), "generated invalid bucket name {name:?}");
    BucketName(name)
}

/// [`generate_default`] for today's UTC date and the thread-local RNG.
pub fn generate_default_now(hint: Option<&str>, prefix: &str, region: &str) -> BucketName {
    let today = chrono::Utc::now().date_naive();
    generate_default(hint, prefix, region, today, &mut rand::thread_rng())
}
