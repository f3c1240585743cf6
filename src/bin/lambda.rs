//! bucketctl-lambda: AWS Lambda entry point
//!
//! Configuration comes from the function's environment. The notifier (and
//! its credential cache) is built once and shared by every warm invocation.

#![recursion_limit = "256"]

use bucketctl::aws::{AwsContext, S3Client, SecretsClient};
use bucketctl::config::{DEFAULT_BUCKET_PREFIX, DEFAULT_REGION, ServiceConfig};
use bucketctl::handler::{BucketEvent, HandlerState, handle_event};
use bucketctl::lifecycle::LifecycleResult;
use bucketctl::notify::{Notifier, SlackClient};
use clap::Parser;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing::info;

/// Function configuration, read from environment variables only
#[derive(Parser, Debug)]
#[command(name = "bucketctl-lambda")]
struct Env {
    /// Region used when an event names none
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Leading segment of generated bucket names
    #[arg(long, env = "BUCKET_PREFIX", default_value = DEFAULT_BUCKET_PREFIX)]
    bucket_prefix: String,

    /// Secrets Manager ARN holding the Slack bot token
    #[arg(long, env = "SLACK_SECRET_ARN")]
    slack_secret_arn: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    // The runtime passes no useful argv; only the environment counts.
    let env = Env::parse_from(["bucketctl-lambda"]);
    info!(
        region = %env.region,
        bucket_prefix = %env.bucket_prefix,
        slack = env.slack_secret_arn.is_some(),
        "Starting bucket handler"
    );

    let aws = AwsContext::new(&env.region).await;
    let state = HandlerState {
        config: ServiceConfig::new(env.bucket_prefix, true),
        default_region: env.region,
        notifier: Notifier::new(
            env.slack_secret_arn,
            SecretsClient::from_context(&aws),
            SlackClient::new()?,
        ),
    };

    run(service_fn(|event: LambdaEvent<BucketEvent>| {
        handle(event, &state, &aws)
    }))
    .await
}

async fn handle(
    event: LambdaEvent<BucketEvent>,
    state: &HandlerState<SecretsClient, SlackClient>,
    aws: &AwsContext,
) -> Result<LifecycleResult, Error> {
    let result = handle_event(event.payload, state, |region| async move {
        S3Client::from_context(&aws.for_region(&region).await)
    })
    .await;
    Ok(result)
}
