use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lambda_edge_stack_lambda::adapters::aws::callback::HttpsResponseSink;
use lambda_edge_stack_lambda::adapters::aws::cloudformation::CloudFormationStackEngine;
use lambda_edge_stack_lambda::adapters::aws::lambda::LambdaFunctionSource;
use lambda_edge_stack_lambda::adapters::aws::s3::S3CodeStore;
use lambda_edge_stack_lambda::adapters::aws::AwsContext;
use lambda_edge_stack_lambda::config::EDGE_REGION_VAR;
use lambda_edge_stack_lambda::handlers::dispatch::dispatch_payload;
use lambda_edge_stack_lambda::handlers::{EdgeServices, InvocationContext};
use lambda_runtime::{service_fn, Context, Error, LambdaEvent};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Lambda@Edge functions can only be created in this region.
const DEFAULT_EDGE_REGION: &str = "us-east-1";

struct EdgeRuntime {
    functions: LambdaFunctionSource,
    code_store: S3CodeStore,
    stacks: CloudFormationStackEngine,
    sink: HttpsResponseSink,
}

impl EdgeRuntime {
    async fn load() -> Self {
        let aws = AwsContext::load().await;
        let http = reqwest::Client::new();
        // Missing configuration is reported per request by the dispatcher.
        let edge_region =
            std::env::var(EDGE_REGION_VAR).unwrap_or_else(|_| DEFAULT_EDGE_REGION.to_string());

        Self {
            functions: LambdaFunctionSource::new(aws.clone(), http.clone()),
            code_store: S3CodeStore::new(aws.clone()),
            stacks: CloudFormationStackEngine::new(&aws, &edge_region),
            sink: HttpsResponseSink::new(http),
        }
    }

    fn services(&self) -> EdgeServices<'_> {
        EdgeServices {
            functions: &self.functions,
            code_store: &self.code_store,
            stacks: &self.stacks,
        }
    }
}

fn invocation_context(context: &Context) -> InvocationContext {
    let deadline = UNIX_EPOCH + Duration::from_millis(context.deadline);
    let remaining = deadline
        .duration_since(SystemTime::now())
        .unwrap_or(Duration::ZERO);
    InvocationContext::with_remaining(context.env_config.log_stream.clone(), remaining)
}

async fn handle_request(
    runtime: &EdgeRuntime,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let LambdaEvent { payload, context } = event;
    let invocation = invocation_context(&context);
    let env = |key: &str| std::env::var(key).ok();

    dispatch_payload(payload, &invocation, &env, runtime.services(), &runtime.sink).await?;

    Ok(json!({ "success": true }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_current_span(false)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();

    let runtime = EdgeRuntime::load().await;
    let runtime = &runtime;
    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(runtime, event).await
    }))
    .await
}
