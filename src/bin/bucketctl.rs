//! bucketctl: create and destroy S3 buckets from the command line
//!
//! Logs go to stderr; a successful create prints the bucket name to stdout
//! so the command composes in shell pipelines.

use anyhow::Result;
use bucketctl::aws::{AwsContext, S3Client, SecretsClient};
use bucketctl::config::{DEFAULT_BUCKET_PREFIX, DEFAULT_REGION, ServiceConfig};
use bucketctl::notify::{Notifier, SlackClient};
use bucketctl::request::{Action, BucketRequest};
use bucketctl::service;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bucketctl")]
#[command(about = "Create and destroy S3 buckets")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Slack options shared by both subcommands
#[derive(clap::Args, Debug)]
struct NotifyArgs {
    /// Post a Slack message after a successful operation
    #[arg(long)]
    notify: bool,

    /// Slack channel (overrides the channel stored in the secret)
    #[arg(long)]
    slack_channel: Option<String>,

    /// Secrets Manager id or ARN holding the Slack bot token
    #[arg(long, env = "SLACK_SECRET_ARN")]
    slack_secret_id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a bucket, generating a name unless one is given
    Create {
        /// Bucket name (default: <prefix>-<hint>-<region>-<date>-<random>)
        #[arg(long)]
        name: Option<String>,

        /// AWS region
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,

        /// Middle segment of a generated name
        #[arg(long)]
        hint: Option<String>,

        /// Leading segment of a generated name
        #[arg(long, env = "BUCKET_PREFIX", default_value = DEFAULT_BUCKET_PREFIX)]
        prefix: String,

        /// Block public access, enable default encryption and tag the bucket
        #[arg(long)]
        harden: bool,

        #[command(flatten)]
        slack: NotifyArgs,
    },

    /// Empty a bucket (all versions and delete markers) and delete it
    Destroy {
        /// Bucket name
        #[arg(long)]
        name: String,

        /// AWS region
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,

        #[command(flatten)]
        slack: NotifyArgs,
    },
}

impl Command {
    fn into_parts(self) -> (BucketRequest, ServiceConfig, NotifyArgs) {
        match self {
            Command::Create {
                name,
                region,
                hint,
                prefix,
                harden,
                slack,
            } => {
                let mut request = BucketRequest::create(region);
                request.name = name;
                request.naming_hint = hint;
                (request, ServiceConfig::new(prefix, harden), slack)
            }
            Command::Destroy {
                name,
                region,
                slack,
            } => (
                BucketRequest::destroy(name, region),
                ServiceConfig::default(),
                slack,
            ),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let (mut request, config, notify_args) = args.command.into_parts();
    if notify_args.notify {
        request = request.with_notify(notify_args.slack_channel);
    }

    let aws = AwsContext::new(&request.region).await;
    let s3 = S3Client::from_context(&aws);
    let notifier = Notifier::new(
        notify_args.slack_secret_id,
        SecretsClient::from_context(&aws),
        SlackClient::new()?,
    );

    if request.notify && !notifier.is_configured() {
        info!("--notify given without --slack-secret-id; no message will be sent");
    }

    let result = service::execute(&s3, &notifier, &config, &request).await;

    match (result.ok, request.action, result.bucket.as_deref()) {
        (true, Action::Create, Some(bucket)) => {
            println!("{bucket}");
            Ok(())
        }
        (true, _, _) => Ok(()),
        (false, action, _) => anyhow::bail!(
            "{action} failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
}
