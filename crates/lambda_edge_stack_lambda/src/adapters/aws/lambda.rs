use async_trait::async_trait;
use tracing::debug;

use crate::adapters::aws::{sdk_error, AwsContext};
use crate::adapters::function_source::{FunctionSnapshot, FunctionSource};
use crate::error::AdapterError;
use crate::runtime::arn::LambdaArn;

const GET_FUNCTION: &str = "GetFunction";

/// Reads the source function from its own region and fetches its package over HTTPS.
pub struct LambdaFunctionSource {
    context: AwsContext,
    http: reqwest::Client,
}

impl LambdaFunctionSource {
    pub fn new(context: AwsContext, http: reqwest::Client) -> Self {
        Self { context, http }
    }
}

fn missing(field: &'static str) -> AdapterError {
    AdapterError::MissingField {
        operation: GET_FUNCTION,
        field,
    }
}

#[async_trait]
impl FunctionSource for LambdaFunctionSource {
    async fn get_function(&self, target: &LambdaArn) -> Result<FunctionSnapshot, AdapterError> {
        let output = self
            .context
            .lambda_client(&target.region)
            .get_function()
            .function_name(&target.name)
            .set_qualifier(target.version.clone())
            .send()
            .await
            .map_err(|error| sdk_error(GET_FUNCTION, error))?;

        let configuration = output
            .configuration()
            .ok_or_else(|| missing("Configuration"))?;
        let code_location = output
            .code()
            .and_then(|code| code.location())
            .ok_or_else(|| missing("Code.Location"))?;

        Ok(FunctionSnapshot {
            description: configuration.description().map(str::to_string),
            runtime: configuration
                .runtime()
                .map(|runtime| runtime.as_str().to_string())
                .ok_or_else(|| missing("Configuration.Runtime"))?,
            handler: configuration
                .handler()
                .map(str::to_string)
                .ok_or_else(|| missing("Configuration.Handler"))?,
            memory_size: configuration
                .memory_size()
                .ok_or_else(|| missing("Configuration.MemorySize"))?,
            timeout: configuration
                .timeout()
                .ok_or_else(|| missing("Configuration.Timeout"))?,
            tracing_mode: configuration
                .tracing_config()
                .and_then(|tracing| tracing.mode())
                .map(|mode| mode.as_str().to_string())
                .ok_or_else(|| missing("Configuration.TracingConfig.Mode"))?,
            code_location: code_location.to_string(),
        })
    }

    async fn download_code(&self, code_location: &str) -> Result<Vec<u8>, AdapterError> {
        let response = self
            .http
            .get(code_location)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| AdapterError::Transport(error.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|error| AdapterError::Transport(error.to_string()))?;
        debug!(size = body.len(), "Downloaded code package");

        Ok(body.to_vec())
    }
}
