//! AWS SDK client construction
//!
//! Credentials and the default region come from the standard provider chain
//! (environment, profile, instance metadata). [`AwsConfig`] only layers
//! explicit overrides on top, mainly for running against LocalStack.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::{debug, info};

use crate::config::AwsConfig;

/// Shared SDK configuration for every client the job builds
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    debug!("Loading AWS SDK configuration: {:?}", aws);

    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &aws.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &aws.endpoint_url {
        info!(endpoint = %endpoint, "Using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}

pub fn s3_client(sdk_config: &SdkConfig, aws: &AwsConfig) -> aws_sdk_s3::Client {
    let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
        .force_path_style(aws.force_path_style)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

pub fn dynamodb_client(sdk_config: &SdkConfig) -> aws_sdk_dynamodb::Client {
    aws_sdk_dynamodb::Client::new(sdk_config)
}
