//! AWS SDK and HTTPS implementations of the adapter traits.

pub mod callback;
pub mod cloudformation;
pub mod lambda;
pub mod s3;

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};

use crate::error::AdapterError;

/// SDK configuration loaded once per process; regional clients derive from it.
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
}

impl AwsContext {
    pub async fn load() -> Self {
        Self::from_sdk_config(aws_config::load_defaults(BehaviorVersion::latest()).await)
    }

    pub fn from_sdk_config(config: SdkConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn cloudformation_client(&self, region: &str) -> aws_sdk_cloudformation::Client {
        let config = aws_sdk_cloudformation::config::Builder::from(self.config.as_ref())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_cloudformation::Client::from_conf(config)
    }

    pub fn lambda_client(&self, region: &str) -> aws_sdk_lambda::Client {
        let config = aws_sdk_lambda::config::Builder::from(self.config.as_ref())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_lambda::Client::from_conf(config)
    }

    pub fn s3_client(&self, region: &str) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::config::Builder::from(self.config.as_ref())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.config.region())
            .finish_non_exhaustive()
    }
}

/// Classifies an SDK operation error by its service error code.
pub(crate) fn sdk_error<E>(operation: &'static str, error: E) -> AdapterError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    AdapterError::Sdk {
        operation,
        code: error.code().map(str::to_string),
        message: DisplayErrorContext(error).to_string(),
    }
}
