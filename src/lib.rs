//! bucketctl - S3 bucket provisioning and teardown
//!
//! Creates buckets (optionally hardened) and destroys them after draining
//! every object version and delete marker, then reports to Slack.
//!
//! ## Binaries
//!
//! - `bucketctl`: command-line front end (feature `cli`)
//! - `bucketctl-lambda`: AWS Lambda event handler (feature `lambda`)
//!
//! Both build a [`request::BucketRequest`] and hand it to [`service::execute`].

pub mod aws;
pub mod config;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod naming;
pub mod notify;
pub mod request;
pub mod service;
