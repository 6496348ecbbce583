//! AWS-backed implementations of the remote service seams
//!
//! Both clients are built from one shared [`SdkConfig`]; credentials come
//! from the ambient AWS credential chain, the region from the resolved
//! deployment target.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_types::error::display::DisplayErrorContext;

use crate::config::Architecture;
use crate::remote::{FunctionService, ObjectStore};
use crate::{Error, Result};

/// Load the shared AWS configuration for a region
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// S3-backed object store
#[derive(Debug, Clone)]
pub struct AwsObjectStore {
    client: aws_sdk_s3::Client,
}

impl AwsObjectStore {
    /// Create a store from the shared SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for AwsObjectStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                Error::upload(
                    format!("{}", DisplayErrorContext(&e)),
                    "Check the bucket name, region, and AWS credentials",
                )
            })?;

        Ok(())
    }
}

/// Lambda-backed function service
#[derive(Debug, Clone)]
pub struct AwsFunctionService {
    client: aws_sdk_lambda::Client,
}

impl AwsFunctionService {
    /// Create a function service from the shared SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_lambda::Client::new(config),
        }
    }
}

#[async_trait]
impl FunctionService for AwsFunctionService {
    async fn update_function_code(
        &self,
        function_name: &str,
        bucket: &str,
        key: &str,
        architecture: Architecture,
    ) -> Result<()> {
        self.client
            .update_function_code()
            .function_name(function_name)
            .s3_bucket(bucket)
            .s3_key(key)
            .architectures(architecture.into())
            .publish(false)
            .dry_run(false)
            .send()
            .await
            .map_err(|e| {
                Error::update(
                    format!("{}", DisplayErrorContext(&e)),
                    "Check the function name and that it exists in this region",
                )
            })?;

        Ok(())
    }
}

impl From<Architecture> for aws_sdk_lambda::types::Architecture {
    fn from(value: Architecture) -> Self {
        match value {
            Architecture::X86_64 => Self::X8664,
            Architecture::Arm64 => Self::Arm64,
        }
    }
}
